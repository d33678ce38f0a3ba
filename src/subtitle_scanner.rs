use log::{debug, error, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::errors::ContainerError;
use crate::language_utils::{self, SubtitleLanguage};

// @module: Discovery of embedded and sidecar subtitles

// @const: Language code in a sidecar filename, e.g. "en", "eng", "pt_BR", "en-US"
static LANGUAGE_CODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z]{2,3}(?:[_-][a-zA-Z]{2,3})?").unwrap()
});

/// Only this container is inspected for embedded subtitles
pub const INSPECTED_EXTENSION: &str = "mkv";

/// A subtitle track as reported by the container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleTrack {
    /// Language code stored in the track header
    pub language: Option<String>,
    /// Display name of the track
    pub name: Option<String>,
}

/// Reads the subtitle tracks of a container
pub trait ContainerInspector: Send + Sync + Debug {
    /// List the subtitle tracks of the container at `path`
    fn subtitle_tracks(&self, path: &Path) -> Result<Vec<SubtitleTrack>, ContainerError>;
}

/// Matroska inspector backed by the `matroska` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct MatroskaInspector;

impl ContainerInspector for MatroskaInspector {
    fn subtitle_tracks(&self, path: &Path) -> Result<Vec<SubtitleTrack>, ContainerError> {
        let file = File::open(path).map_err(|source| ContainerError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);

        let mkv = matroska::Matroska::open(reader).map_err(|e| ContainerError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let tracks = mkv
            .tracks
            .iter()
            .filter(|track| track.tracktype == matroska::Tracktype::Subtitle)
            .map(|track| SubtitleTrack {
                language: track.language.as_ref().map(|l| l.to_string()),
                name: track.name.clone(),
            })
            .collect();

        Ok(tracks)
    }
}

fn has_inspected_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(INSPECTED_EXTENSION))
        .unwrap_or(false)
}

/// Resolve the language of one embedded track
///
/// The language code wins over the display name; a track with neither is
/// undefined.
pub fn track_language(track: &SubtitleTrack) -> SubtitleLanguage {
    let code = track.language.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let name = track.name.as_deref().map(str::trim).filter(|s| !s.is_empty());

    match (code, name) {
        (Some(code), _) => language_utils::resolve_code(code),
        (None, Some(name)) => language_utils::resolve(name),
        (None, None) => SubtitleLanguage::Undefined,
    }
}

/// Count the subtitle tracks of a container, zero when it cannot be read
///
/// Unlike [`scan_embedded`] this is not limited to `.mkv`: other Matroska
/// based inputs such as `.webm` keep their subtitle streams through a remux,
/// and the appended track is numbered after them.
pub fn count_embedded<I: ContainerInspector + ?Sized>(inspector: &I, container_path: &Path) -> usize {
    if !container_path.is_file() {
        return 0;
    }
    inspector
        .subtitle_tracks(container_path)
        .map(|tracks| tracks.len())
        .unwrap_or(0)
}

/// Search for embedded subtitles in a container and return their languages
///
/// Containers other than Matroska are not opened and yield an empty set, as
/// do containers that fail to parse.
pub fn scan_embedded<I: ContainerInspector + ?Sized>(inspector: &I, container_path: &Path) -> BTreeSet<SubtitleLanguage> {
    let mut languages = BTreeSet::new();

    if !has_inspected_extension(container_path) {
        return languages;
    }

    let tracks = match inspector.subtitle_tracks(container_path) {
        Ok(tracks) => tracks,
        Err(e) => {
            error!("Parsing video metadata failed: {}", e);
            return languages;
        }
    };

    if tracks.is_empty() {
        debug!("{:?} has no subtitle track", container_path);
        return languages;
    }

    languages.extend(tracks.iter().map(track_language));
    debug!("Found embedded subtitles {:?} in {:?}", languages, container_path);

    languages
}

/// Search for sidecar subtitles next to a video and infer their language
///
/// A file is a candidate when its name starts with the video's stem and ends
/// with one of `extensions`. The language is read from what lies between the
/// two; when nothing parses, `default_language` is used.
pub fn scan_external(
    video_path: &Path,
    default_language: SubtitleLanguage,
    extensions: &[String],
) -> BTreeMap<PathBuf, SubtitleLanguage> {
    let mut subtitles = BTreeMap::new();

    let dir = match video_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let stem = match video_path.file_stem() {
        Some(stem) => stem.to_string_lossy().to_string(),
        None => return subtitles,
    };

    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list directory {:?}: {}", dir, e);
            return subtitles;
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let file_name = entry.file_name().to_string_lossy().to_string();

        if !file_name.starts_with(&stem) {
            continue;
        }
        let Some(extension) = extensions.iter().find(|ext| file_name.ends_with(ext.as_str())) else {
            continue;
        };
        if file_name.len() < stem.len() + extension.len() {
            continue;
        }

        let lookup = &file_name[stem.len()..file_name.len() - extension.len()];
        let language = match LANGUAGE_CODE_REGEX.find(lookup) {
            Some(m) => {
                let code = m.as_str().replace('_', "-");
                match language_utils::parse_language(&code) {
                    Some(lang) => SubtitleLanguage::Known(lang),
                    None => {
                        error!("Cannot parse language code '{}'", code);
                        default_language
                    }
                }
            }
            None => default_language,
        };

        subtitles.insert(dir.join(&file_name), language);
    }

    debug!("Found subtitles {:?}", subtitles);
    subtitles
}
