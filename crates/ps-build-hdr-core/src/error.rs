//! Error types for the HDR batch pipeline.
//!
//! Every detected failure is fatal to the run. The variants exist so the
//! binary can tell the user *what* failed (which tool, which image, which
//! stage) and where to look for the captured tool output.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for ps-build-hdr operations.
#[derive(Error, Debug)]
pub enum HdrError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tool resolution errors
    #[error("{0}")]
    Tool(#[from] ToolError),

    /// Pipeline processing errors
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while locating or starting external tools.
#[derive(Error, Debug)]
pub enum ToolError {
    /// A mandatory binary is not on the search path
    #[error("Required tool not found on PATH: {0}")]
    NotFound(String),

    /// Neither exposure metadata backend is installed
    #[error("No exposure metadata backend available (install exiftool or ImageMagick)")]
    NoMetadataBackend,

    /// The process could not be started at all
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Per-batch processing errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Exposure time, ISO or aperture missing or unreadable for one image
    #[error("Exposure metadata unavailable for {path}: {message}")]
    MetadataUnavailable { path: PathBuf, message: String },

    /// An external stage exited with a non-zero status
    #[error(
        "{stage} stage failed (exit status {})\n  command: {command}\n  see log: {}",
        .status.map_or_else(|| "signal".to_string(), |c| c.to_string()),
        .log_path.display()
    )]
    StageFailure {
        stage: String,
        command: String,
        status: Option<i32>,
        log_path: PathBuf,
    },

    /// Filesystem operation on a batch artifact failed
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external tool could not be launched mid-pipeline
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Convenience type alias for ps-build-hdr results.
pub type Result<T> = std::result::Result<T, HdrError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
