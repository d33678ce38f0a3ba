/*!
 * Error types for the mkvembed application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while inspecting a media container
#[derive(Error, Debug)]
pub enum ContainerError {
    /// The container could not be opened
    #[error("Failed to open container {path:?}: {source}")]
    Open {
        /// Container path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The container structure could not be parsed
    #[error("Failed to parse container {path:?}: {message}")]
    Parse {
        /// Container path
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

/// Errors that abort the conversion of a single video
#[derive(Error, Debug)]
pub enum ConversionError {
    /// No target language was requested
    #[error("No video to convert: at least one target language must be selected")]
    NoTargetLanguages,

    /// The source video is not on disk
    #[error("Video file does not exist: {0:?}")]
    MissingVideo(PathBuf),

    /// A subtitle selected for embedding disappeared before the remux
    #[error("Subtitle file does not exist: {0:?}")]
    MissingSubtitle(PathBuf),

    /// The remux executable could not be found
    #[error("Remux tool '{0}' was not found in the execution environment")]
    ToolNotFound(String),

    /// The remux executable ran but reported a failure
    #[error("Remux tool '{tool}' failed with status {status}: {stderr}")]
    ToolFailed {
        /// Executable name
        tool: String,
        /// Exit status description
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// The remux executable did not finish in time
    #[error("Remux tool '{tool}' timed out after {secs} seconds")]
    ToolTimeout {
        /// Executable name
        tool: String,
        /// Timeout that was exceeded
        secs: u64,
    },

    /// File system error around the conversion
    #[error("I/O error during conversion: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while filing a converted video
#[derive(Error, Debug)]
pub enum FilingError {
    /// The converted video is not on disk
    #[error("Converted video does not exist: {0:?}")]
    MissingVideo(PathBuf),

    /// Link directory or link creation failed
    #[error("Failed to create link {path:?}: {source}")]
    Link {
        /// Link location
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur when talking to the metadata service
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// The service has no record for the identifier
    #[error("No metadata found for '{0}'")]
    NotFound(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a conversion
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Error from filing
    #[error("Filing error: {0}")]
    Filing(#[from] FilingError),

    /// Error from the metadata service
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
