/*!
 * Filing of converted videos.
 *
 * Converted videos are placed by kind (`Series/<name>/Season <n>`, `Films`,
 * `Others`) under the library root. Movies additionally get symbolic links
 * in a browse-by tree: `Films/<label>/<value>/<file>` for each grouping
 * attribute value.
 */

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_config::FilingConfig;
use crate::errors::FilingError;
use crate::video::{GroupingAttribute, Video, VideoKind};

pub mod fuzzy;

pub use fuzzy::FuzzyMatcher;

/// Directory layout of the library
#[derive(Debug, Clone)]
pub struct LibraryLayout {
    config: FilingConfig,
    matcher: FuzzyMatcher,
}

impl LibraryLayout {
    pub fn new(config: FilingConfig) -> Self {
        let matcher = FuzzyMatcher::new(config.series_match_threshold);
        Self { config, matcher }
    }

    pub fn config(&self) -> &FilingConfig {
        &self.config
    }

    /// Directory of a video under `save_dir`
    ///
    /// Series names are matched against existing series directories so minor
    /// title variations do not create near-duplicates.
    pub fn destination_dir(&self, video: &Video, save_dir: &Path) -> PathBuf {
        match &video.kind {
            VideoKind::Episode { series, season, .. } => {
                let series_root = save_dir.join(&self.config.series_dir);
                let series_name = self
                    .closest_series_dir(&series_root, series)
                    .unwrap_or_else(|| series.clone());
                series_root.join(series_name).join(format!("Season {}", season))
            }
            VideoKind::Movie { .. } => save_dir.join(&self.config.movies_dir),
            VideoKind::Other => {
                info!("Video {} is neither a movie nor an episode", video);
                save_dir.join(&self.config.others_dir)
            }
        }
    }

    fn closest_series_dir(&self, series_root: &Path, series: &str) -> Option<String> {
        let existing: Vec<String> = fs::read_dir(series_root)
            .ok()?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();

        let found = self.matcher.find_best_match(series, &existing).map(str::to_string);
        if let Some(name) = &found {
            debug!("Series '{}' filed under existing directory '{}'", series, name);
        }
        found
    }

    /// Create the browse-by links of a converted movie
    ///
    /// Every comma-separated value of each attribute gets a title-cased
    /// directory holding a symbolic link to the canonical path of `video_path`.
    /// Existing links at the same place are replaced. Videos that are not
    /// movies get no links.
    pub fn link_views(
        &self,
        video: &Video,
        save_dir: &Path,
        video_path: &Path,
        attributes: &[GroupingAttribute],
    ) -> Result<Vec<PathBuf>, FilingError> {
        if !video_path.is_file() {
            info!("Original video does not exist: {:?}", video_path);
            return Err(FilingError::MissingVideo(video_path.to_path_buf()));
        }
        if !video.is_movie() {
            return Ok(Vec::new());
        }

        let target = fs::canonicalize(video_path).map_err(|source| FilingError::Link {
            path: video_path.to_path_buf(),
            source,
        })?;
        let Some(file_name) = video_path.file_name() else {
            return Err(FilingError::MissingVideo(video_path.to_path_buf()));
        };

        let mut links = Vec::new();
        for attribute in attributes {
            let Some(raw) = video.grouping_value(*attribute) else {
                debug!("{} has no {}, no link created", video, attribute);
                continue;
            };

            for value in split_values(raw) {
                let link_dir = save_dir
                    .join(&self.config.movies_dir)
                    .join(self.config.label(*attribute))
                    .join(&value);
                fs::create_dir_all(&link_dir).map_err(|source| FilingError::Link {
                    path: link_dir.clone(),
                    source,
                })?;

                let link = link_dir.join(file_name);
                if fs::symlink_metadata(&link).is_ok_and(|m| m.file_type().is_symlink()) {
                    fs::remove_file(&link).map_err(|source| FilingError::Link {
                        path: link.clone(),
                        source,
                    })?;
                    info!("Destination link already exists, overwritten: {:?}", link);
                }

                symlink(&target, &link).map_err(|source| FilingError::Link {
                    path: link.clone(),
                    source,
                })?;
                info!("Symbolic link created at: {:?}", link);
                links.push(link);
            }
        }

        Ok(links)
    }
}

impl Default for LibraryLayout {
    fn default() -> Self {
        Self::new(FilingConfig::default())
    }
}

/// Split "action, sci-fi" into title-cased values
pub fn split_values(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(title_case)
        .collect()
}

/// Uppercase the first letter of every word, lowercase the rest
pub fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(c);
            at_word_start = true;
        }
    }
    result
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
