//! ps-build-hdr core - batch HDR builds from bracketed exposures.
//!
//! The heavy lifting is delegated to external programs: an HDR merge /
//! tone-mapping engine, a layer-compositing image editor and, optionally, a
//! metadata tool. This crate groups input files into exposure sets, computes
//! and normalizes their exposure values, and sequences the tool invocations.
//!
//! # Architecture
//!
//! ```text
//! files → partition → batch → EXIF → EV → normalize
//!                                          ↓
//!            merge → tone-map A → tone-map B → composite → metadata copy
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use ps_build_hdr_core::{Config, ExposureExtractor, Pipeline, PipelineOptions, RunLog, ToolResolver};
//!
//! let config = Config::load()?;
//! let resolver = ToolResolver::new(config.tools.clone());
//! let tools = resolver.resolve().await?;
//! let extractor = ExposureExtractor::select(config.metadata.backend, &resolver)?;
//! let pipeline = Pipeline::new(tools, extractor, RunLog::new(config.log_path()), PipelineOptions::default());
//! let batch = ps_build_hdr_core::pipeline::explicit_batch(vec!["a.jpg".into(), "b.jpg".into()]).unwrap();
//! let produced = pipeline.run(&batch).await?;
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod exposure;
pub mod pipeline;
pub mod tools;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, HdrError, PipelineError, PipelineResult, Result, ToolError};
pub use exposure::{exposure_value, EvWindow, ExposureExtractor};
pub use pipeline::{BatchMode, Pipeline, PipelineOptions, RunLog, RunReport};
pub use tools::{ExternalTool, ToolResolver, ToolSet};
pub use types::{Batch, ExposureSample, ImageRef};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
