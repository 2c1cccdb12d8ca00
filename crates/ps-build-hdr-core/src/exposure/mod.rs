//! Exposure metadata extraction and exposure-value computation.
//!
//! ```text
//! image → backend (exiftool | identify | native) → (t, iso, N) → EV
//! ```

mod backend;
pub mod normalize;

pub use backend::{ExiftoolBackend, IdentifyBackend, NativeExifBackend};
pub use normalize::{normalize, EvWindow, EV_LIMIT};

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::BackendPreference;
use crate::error::{PipelineError, PipelineResult, ToolError};
use crate::tools::{ProcessTool, ToolResolver};
use crate::types::{Batch, ExposureSample, ImageRef};

/// Metering calibration constant in the EV formula.
pub const CALIBRATION: f64 = 12.07488;

/// Exposure value for one shot: `log2(t * iso / (N² * 12.07488))`.
pub fn exposure_value(exposure_time: f64, iso: f64, f_number: f64) -> f64 {
    ((exposure_time * iso) / (f_number * f_number * CALIBRATION)).log2()
}

/// Raw exposure settings as reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureReading {
    pub exposure_time: Option<f64>,
    pub iso: Option<f64>,
    pub f_number: Option<f64>,
}

/// A source of exposure settings for image files.
#[async_trait]
pub trait ExposureBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn read(&self, image: &ImageRef) -> PipelineResult<ExposureReading>;
}

/// Turns images into [`ExposureSample`]s using one backend for the whole run.
pub struct ExposureExtractor {
    backend: Box<dyn ExposureBackend>,
}

impl ExposureExtractor {
    pub fn new(backend: Box<dyn ExposureBackend>) -> Self {
        Self { backend }
    }

    /// Pick a backend according to preference and what is installed.
    ///
    /// `Auto` prefers exiftool and falls back to identify. With neither on
    /// the search path the run cannot start.
    pub fn select(
        preference: BackendPreference,
        resolver: &ToolResolver,
    ) -> Result<Self, ToolError> {
        let exiftool = || {
            resolver
                .locate(&resolver.tools().metadata_tool)
                .map(|path| ExiftoolBackend::new(Arc::new(ProcessTool::new(path))))
        };
        let identify = || {
            resolver
                .locate(&resolver.tools().identify)
                .map(|path| IdentifyBackend::new(Arc::new(ProcessTool::new(path))))
        };

        let backend: Box<dyn ExposureBackend> = match preference {
            BackendPreference::Auto => match (exiftool(), identify()) {
                (Some(b), _) => Box::new(b),
                (None, Some(b)) => Box::new(b),
                (None, None) => return Err(ToolError::NoMetadataBackend),
            },
            BackendPreference::Exiftool => Box::new(
                exiftool()
                    .ok_or_else(|| ToolError::NotFound(resolver.tools().metadata_tool.clone()))?,
            ),
            BackendPreference::Identify => Box::new(
                identify().ok_or_else(|| ToolError::NotFound(resolver.tools().identify.clone()))?,
            ),
            BackendPreference::Native => Box::new(NativeExifBackend),
        };
        tracing::debug!("Exposure metadata backend: {}", backend.name());
        Ok(Self { backend })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Read one image's exposure settings and compute its EV.
    pub async fn sample(&self, image: &ImageRef) -> PipelineResult<ExposureSample> {
        let reading = self.backend.read(image).await?;
        let exposure_time = require_positive(image, "exposure time", reading.exposure_time)?;
        let iso = require_positive(image, "ISO", reading.iso)?;
        let f_number = require_positive(image, "f-number", reading.f_number)?;

        let ev = exposure_value(exposure_time, iso, f_number);
        tracing::debug!(
            "{}: t={exposure_time}s iso={iso} f/{f_number} ev={ev:.4}",
            image.file_name()
        );
        Ok(ExposureSample {
            image: image.clone(),
            exposure_time,
            iso,
            f_number,
            ev,
        })
    }

    /// Sample every image of a batch, in batch order. Stops at the first failure.
    pub async fn sample_batch(&self, batch: &Batch) -> PipelineResult<Vec<ExposureSample>> {
        let mut samples = Vec::with_capacity(batch.len());
        for image in batch.images() {
            samples.push(self.sample(image).await?);
        }
        Ok(samples)
    }
}

fn require_positive(image: &ImageRef, what: &str, value: Option<f64>) -> PipelineResult<f64> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(v) => Err(PipelineError::MetadataUnavailable {
            path: image.path().to_path_buf(),
            message: format!("{what} must be positive, got {v}"),
        }),
        None => Err(PipelineError::MetadataUnavailable {
            path: image.path().to_path_buf(),
            message: format!("{what} missing"),
        }),
    }
}

/// Parse an EXIF numeric value as printed by metadata tools: `0.008`,
/// `1/125`, `56/10`, or a list whose first entry is used.
pub fn parse_exif_number(raw: &str) -> Option<f64> {
    let first = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .find(|s| !s.is_empty())?;
    let value = match first.split_once('/') {
        Some((num, den)) => num.parse::<f64>().ok()? / den.parse::<f64>().ok()?,
        None => first.parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}
