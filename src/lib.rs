/*!
 * # mkvembed - Embed sidecar subtitles into Matroska videos
 *
 * A Rust library that finds the subtitle files lying next to a video and
 * embeds the missing languages into an `.mkv` container.
 *
 * ## Features
 *
 * - Resolve subtitle languages from ISO 639 codes, locale tags or names
 * - Read the subtitle tracks already embedded in a Matroska container
 * - Discover sidecar subtitles and infer their language from the file name
 * - Plan the cheapest remux: ffmpeg for one subtitle, mkvmerge for several
 * - Skip videos that already carry every requested language
 * - File converted videos into a library with browse-by symbolic links
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: Per-video and batch conversion workflow
 * - `language_utils`: ISO language code utilities
 * - `subtitle_scanner`: Embedded and sidecar subtitle discovery
 * - `planner`: Embeddable subtitles and remux strategy selection
 * - `remux`: ffmpeg and mkvmerge executors
 * - `filing`: Library placement and symbolic link views
 * - `metadata`: Movie database lookups used for filing
 * - `video`: Video descriptors
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod filing;
pub mod language_utils;
pub mod metadata;
pub mod planner;
pub mod remux;
pub mod subtitle_scanner;
pub mod video;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{ConversionOutcome, ConvertedVideo, Controller};
pub use language_utils::{parse_language, resolve, SubtitleLanguage};
pub use planner::{ConversionPlan, Strategy};
pub use video::{GroupingAttribute, Video, VideoKind};
pub use errors::{AppError, ContainerError, ConversionError, FilingError, MetadataError};
