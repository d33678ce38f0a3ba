use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::default::Default;
use std::path::PathBuf;

use crate::errors::AppError;
use crate::language_utils::{self, SubtitleLanguage};
use crate::video::GroupingAttribute;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Target subtitle languages (ISO codes or English names)
    #[serde(default)]
    pub languages: Vec<String>,

    /// Embed one language or every missing one
    #[serde(default)]
    pub mode: EmbedMode,

    /// Extension of sidecar subtitle files
    #[serde(default = "default_subtitle_extension")]
    pub subtitle_extension: String,

    /// Extension of the converted video
    #[serde(default = "default_video_extension")]
    pub video_extension: String,

    /// Root of the library; converted videos stay next to their source when unset
    #[serde(default)]
    pub save_dir: Option<PathBuf>,

    /// Delete sidecar subtitles once embedded
    #[serde(default)]
    pub delete_subtitles: bool,

    /// Convert again even when the output already exists
    #[serde(default)]
    pub force_copy: bool,

    /// Always use mkvmerge
    #[serde(default)]
    pub force_mkvmerge: bool,

    /// Create the browse-by-attribute link tree under `save_dir`
    #[serde(default = "default_true")]
    pub create_soft_links: bool,

    /// Filing settings
    #[serde(default)]
    pub filing: FilingConfig,

    /// External tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Metadata service settings
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Embedding mode
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMode {
    /// Embed a single language with ffmpeg
    #[default]
    Single,
    /// Embed every missing language, with mkvmerge when there are several
    Multi,
}

/// Where converted videos and their links are placed
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilingConfig {
    /// Attributes of the browse-by link tree
    #[serde(default = "default_link_attributes")]
    pub link_attributes: Vec<String>,

    /// Directory for movies, also the root of the link tree
    #[serde(default = "default_movies_dir")]
    pub movies_dir: String,

    /// Directory for series
    #[serde(default = "default_series_dir")]
    pub series_dir: String,

    /// Directory for everything else
    #[serde(default = "default_others_dir")]
    pub others_dir: String,

    /// Label of the language link directory
    #[serde(default = "default_language_label")]
    pub language_label: String,

    /// Label of the country link directory
    #[serde(default = "default_country_label")]
    pub country_label: String,

    /// Label of the genre link directory
    #[serde(default = "default_genre_label")]
    pub genre_label: String,

    /// Minimum similarity to reuse an existing series directory (0.0-1.0)
    #[serde(default = "default_series_match_threshold")]
    pub series_match_threshold: f32,
}

impl Default for FilingConfig {
    fn default() -> Self {
        Self {
            link_attributes: default_link_attributes(),
            movies_dir: default_movies_dir(),
            series_dir: default_series_dir(),
            others_dir: default_others_dir(),
            language_label: default_language_label(),
            country_label: default_country_label(),
            genre_label: default_genre_label(),
            series_match_threshold: default_series_match_threshold(),
        }
    }
}

impl FilingConfig {
    /// Parsed link attributes
    pub fn grouping_attributes(&self) -> Result<Vec<GroupingAttribute>, AppError> {
        self.link_attributes.iter().map(|a| a.parse()).collect()
    }

    /// Directory label for an attribute
    pub fn label(&self, attribute: GroupingAttribute) -> &str {
        match attribute {
            GroupingAttribute::Language => &self.language_label,
            GroupingAttribute::Country => &self.country_label,
            GroupingAttribute::Genre => &self.genre_label,
        }
    }
}

/// External remux tools
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolsConfig {
    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// mkvmerge executable
    #[serde(default = "default_mkvmerge_path")]
    pub mkvmerge_path: String,

    /// Timeout of a single tool run in seconds, 0 disables it
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            mkvmerge_path: default_mkvmerge_path(),
            timeout_secs: default_tool_timeout_secs(),
        }
    }
}

/// Metadata service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MetadataConfig {
    /// Query the service at all
    #[serde(default)]
    pub enabled: bool,

    /// Service endpoint URL
    #[serde(default = "default_metadata_endpoint")]
    pub endpoint: String,

    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_metadata_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_metadata_endpoint(),
            api_key: String::new(),
            timeout_secs: default_metadata_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_subtitle_extension() -> String {
    ".srt".to_string()
}

fn default_video_extension() -> String {
    ".mkv".to_string()
}

fn default_true() -> bool {
    true
}

fn default_link_attributes() -> Vec<String> {
    vec!["country".to_string(), "genre".to_string()]
}

fn default_movies_dir() -> String {
    "Films".to_string()
}

fn default_series_dir() -> String {
    "Series".to_string()
}

fn default_others_dir() -> String {
    "Others".to_string()
}

fn default_language_label() -> String {
    "By Language".to_string()
}

fn default_country_label() -> String {
    "By Country".to_string()
}

fn default_genre_label() -> String {
    "By Genre".to_string()
}

fn default_series_match_threshold() -> f32 {
    0.8
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_mkvmerge_path() -> String {
    "mkvmerge".to_string()
}

fn default_tool_timeout_secs() -> u64 {
    3600 // remuxing a large file can take a while
}

fn default_metadata_endpoint() -> String {
    "https://www.omdbapi.com".to_string()
}

fn default_metadata_timeout_secs() -> u64 {
    30
}

/// Normalize an extension to start with a single dot
pub fn normalize_extension(extension: &str) -> String {
    format!(".{}", extension.trim().trim_start_matches('.'))
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), AppError> {
        for language in &self.languages {
            if language_utils::parse_language(language).is_none() {
                return Err(AppError::Config(format!("Invalid language: {}", language)));
            }
        }

        if self.mode == EmbedMode::Multi && self.languages.is_empty() {
            return Err(AppError::Config("At least one language must be selected".to_string()));
        }

        if normalize_extension(&self.subtitle_extension).len() < 2 {
            return Err(AppError::Config("Subtitle extension is empty".to_string()));
        }

        if normalize_extension(&self.video_extension).len() < 2 {
            return Err(AppError::Config("Video extension is empty".to_string()));
        }

        self.filing.grouping_attributes()?;

        if !(0.0..=1.0).contains(&self.filing.series_match_threshold) {
            return Err(AppError::Config(format!(
                "Series match threshold must be between 0 and 1, got {}",
                self.filing.series_match_threshold
            )));
        }

        if self.metadata.enabled && self.metadata.api_key.is_empty() {
            return Err(AppError::Config("Metadata API key is required when metadata lookup is enabled".to_string()));
        }

        Ok(())
    }

    /// Target languages for a run
    ///
    /// Single mode keeps only the first configured language and defaults to
    /// English; multi mode uses every configured language.
    pub fn target_languages(&self) -> BTreeSet<SubtitleLanguage> {
        let parsed = self.languages.iter().filter_map(|l| language_utils::parse_language(l));

        match self.mode {
            EmbedMode::Single => {
                let language = parsed
                    .map(SubtitleLanguage::Known)
                    .next()
                    .unwrap_or_else(|| language_utils::resolve("eng"));
                BTreeSet::from([language])
            }
            EmbedMode::Multi => parsed.map(SubtitleLanguage::Known).collect(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            languages: vec!["eng".to_string()],
            mode: EmbedMode::default(),
            subtitle_extension: default_subtitle_extension(),
            video_extension: default_video_extension(),
            save_dir: None,
            delete_subtitles: false,
            force_copy: false,
            force_mkvmerge: false,
            create_soft_links: true,
            filing: FilingConfig::default(),
            tools: ToolsConfig::default(),
            metadata: MetadataConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
