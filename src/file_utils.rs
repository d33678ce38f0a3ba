use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::app_config::normalize_extension;

// @module: File and directory utilities

// @const: Video containers picked up when walking a directory
pub const VIDEO_EXTENSIONS: [&str; 14] = [
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v",
    "mpg", "mpeg", "ogv", "ts", "mts", "m2ts",
];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
        let path = path.as_ref();
        if !Self::dir_exists(path) {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Output path of a converted video
    // @params: output_dir, stem, extension (with or without the dot)
    pub fn generate_output_path<P: AsRef<Path>>(output_dir: P, stem: &str, extension: &str) -> PathBuf {
        let mut file_name = stem.to_string();
        file_name.push_str(&normalize_extension(extension));
        output_dir.as_ref().join(file_name)
    }

    // @checks: Known video extension
    pub fn is_video_file<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        path.is_file()
            && path
                .extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy().to_lowercase();
                    VIDEO_EXTENSIONS.contains(&ext.as_str())
                })
                .unwrap_or(false)
    }

    /// Find video files in a directory, recursively, in file name order
    pub fn find_videos<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            // Link trees point back at converted files
            if entry.path_is_symlink() {
                continue;
            }
            if Self::is_video_file(path) {
                result.push(path.to_path_buf());
            }
        }

        Ok(result)
    }
}
