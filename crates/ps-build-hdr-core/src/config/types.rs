//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Batch grouping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Images per batch in directory-scan mode
    pub number: usize,

    /// Keep the merged radiance map next to the output
    pub keep_hdr: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            number: 3,
            keep_hdr: false,
        }
    }
}

/// Program names looked up on the search path at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// HDR merge / tone-mapping engine (mandatory)
    pub hdr_engine: String,

    /// Layer-compositing image editor (mandatory)
    pub compositor: String,

    /// Feature-based alignment helper (optional)
    pub align_helper: String,

    /// Metadata reader/writer, also the preferred exposure backend (optional)
    pub metadata_tool: String,

    /// Generic image-metadata tool, the fallback exposure backend
    pub identify: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            hdr_engine: "luminance-hdr-cli".to_string(),
            compositor: "gimp".to_string(),
            align_helper: "align_image_stack".to_string(),
            metadata_tool: "exiftool".to_string(),
            identify: "identify".to_string(),
        }
    }
}

/// Which exposure metadata backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// exiftool if installed, else identify
    #[default]
    Auto,
    Exiftool,
    Identify,
    /// In-process EXIF reader, no external binary
    Native,
}

/// Exposure metadata settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub backend: BackendPreference,
}

/// Run log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Append-only file receiving banners and raw tool output
    pub path: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("~/.ps-build-hdr.log"),
        }
    }
}

/// Diagnostic logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: pretty or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
