/*!
 * Video descriptors.
 *
 * A video is a file on disk plus what is known about it: its kind (movie,
 * episode or anything else), an optional title and the metadata that drives
 * filing. Descriptors can be built from a filename alone; the remote
 * metadata lookup fills in the rest.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::AppError;

// @const: SxxEyy episode marker, with the series name before it
static EPISODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?P<series>.+?)[\s._-]+s(?P<season>\d{1,2})[\s._-]?e(?P<episode>\d{1,3})(?:[\s._-]+(?P<title>.+))?$").unwrap()
});

// @const: Movie title followed by a year, "(2013)" or ".2013."
static MOVIE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<title>.+?)[\s._]*[(\[]?(?P<year>(?:19|20)\d{2})[)\]]?(?:[\s._].*)?$").unwrap()
});

/// Attribute a movie can be grouped by in the link tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingAttribute {
    /// Spoken language(s)
    #[serde(alias = "lang")]
    Language,
    /// Production country(ies)
    Country,
    /// Genre(s)
    Genre,
}

impl GroupingAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Language => "language",
            Self::Country => "country",
            Self::Genre => "genre",
        }
    }
}

impl fmt::Display for GroupingAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GroupingAttribute {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "language" | "lang" => Ok(Self::Language),
            "country" => Ok(Self::Country),
            "genre" => Ok(Self::Genre),
            other => Err(AppError::Config(format!("Unknown grouping attribute: {}", other))),
        }
    }
}

/// Metadata gathered from the remote database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// IMDb identifier of the video (movie or episode)
    pub imdb_id: Option<String>,
    /// IMDb identifier of the series, for episodes
    pub series_imdb_id: Option<String>,
    /// Comma separated genres
    pub genre: Option<String>,
    /// Comma separated countries
    pub country: Option<String>,
    /// Comma separated spoken languages
    pub language: Option<String>,
    /// Set once a lookup has been attempted
    #[serde(default)]
    pub enriched: bool,
}

/// Kind of video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VideoKind {
    Movie {
        year: Option<u16>,
    },
    Episode {
        series: String,
        season: u32,
        episode: u32,
    },
    Other,
}

/// A video file and what is known about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    /// Location of the video on disk
    pub path: PathBuf,
    /// Title of the movie or of the episode
    pub title: Option<String>,
    /// Movie, episode or other
    pub kind: VideoKind,
    /// Remote metadata
    #[serde(default)]
    pub metadata: VideoMetadata,
}

impl Video {
    pub fn movie(path: impl Into<PathBuf>, title: Option<String>, year: Option<u16>) -> Self {
        Self {
            path: path.into(),
            title,
            kind: VideoKind::Movie { year },
            metadata: VideoMetadata::default(),
        }
    }

    pub fn episode(
        path: impl Into<PathBuf>,
        series: impl Into<String>,
        season: u32,
        episode: u32,
        title: Option<String>,
    ) -> Self {
        Self {
            path: path.into(),
            title,
            kind: VideoKind::Episode {
                series: series.into(),
                season,
                episode,
            },
            metadata: VideoMetadata::default(),
        }
    }

    pub fn other(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            title: None,
            kind: VideoKind::Other,
            metadata: VideoMetadata::default(),
        }
    }

    /// Guess a descriptor from the file name
    ///
    /// `Show.Name.S01E03.Episode.Title.mkv` becomes an episode,
    /// `Movie Title (2013).mkv` or `Movie.Title.2013.1080p.mkv` a movie,
    /// anything else `Other`. Episode titles are kept only when the name
    /// carries one; movie titles always are.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        if let Some(caps) = EPISODE_REGEX.captures(&stem) {
            let season = caps["season"].parse().unwrap_or_default();
            let episode = caps["episode"].parse().unwrap_or_default();
            let title = caps.name("title").map(|m| clean_name(m.as_str()));
            return Self::episode(path, clean_name(&caps["series"]), season, episode, title);
        }

        if let Some(caps) = MOVIE_REGEX.captures(&stem) {
            let year = caps["year"].parse().ok();
            return Self::movie(path, Some(clean_name(&caps["title"])), year);
        }

        Self::other(path)
    }

    pub fn is_movie(&self) -> bool {
        matches!(self.kind, VideoKind::Movie { .. })
    }

    pub fn is_episode(&self) -> bool {
        matches!(self.kind, VideoKind::Episode { .. })
    }

    /// Value of a grouping attribute, if the variant carries it and it is known
    ///
    /// Only movies are grouped; episodes and other videos always return `None`.
    pub fn grouping_value(&self, attribute: GroupingAttribute) -> Option<&str> {
        match &self.kind {
            VideoKind::Movie { .. } => {
                let value = match attribute {
                    GroupingAttribute::Language => self.metadata.language.as_deref(),
                    GroupingAttribute::Country => self.metadata.country.as_deref(),
                    GroupingAttribute::Genre => self.metadata.genre.as_deref(),
                };
                value.filter(|v| !v.trim().is_empty())
            }
            VideoKind::Episode { .. } | VideoKind::Other => None,
        }
    }

    /// Check whether any of the attributes still lacks a value
    pub fn is_missing_any(&self, attributes: &[GroupingAttribute]) -> bool {
        self.is_movie() && attributes.iter().any(|a| self.grouping_value(*a).is_none())
    }

    /// Name of the converted file, without extension
    pub fn output_stem(&self) -> String {
        match (&self.kind, &self.title) {
            (VideoKind::Episode { episode, .. }, Some(title)) => format!("{:02} - {}", episode, title),
            (_, Some(title)) => title.clone(),
            _ => self
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            VideoKind::Episode { series, season, episode } => {
                write!(f, "{} s{:02}e{:02}", series, season, episode)?;
                if let Some(title) = &self.title {
                    write!(f, " - {}", title)?;
                }
                Ok(())
            }
            VideoKind::Movie { year } => {
                let title = self.title.as_deref().unwrap_or("Untitled");
                match year {
                    Some(year) => write!(f, "{} ({})", title, year),
                    None => write!(f, "{}", title),
                }
            }
            VideoKind::Other => write!(f, "{}", self.path.display()),
        }
    }
}

// Dots and underscores are common word separators in release names
fn clean_name(raw: &str) -> String {
    raw.replace(['.', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c.is_whitespace())
        .to_string()
}
