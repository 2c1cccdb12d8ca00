//! Exposure metadata backends.

use async_trait::async_trait;
use exif::{In, Reader, Tag, Value};
use std::ffi::OsString;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::error::{PipelineError, PipelineResult};
use crate::tools::{os_args, ExternalTool};
use crate::types::ImageRef;

use super::{parse_exif_number, ExposureBackend, ExposureReading};

/// Reads exposure settings with `exiftool -s -n`.
pub struct ExiftoolBackend {
    tool: Arc<dyn ExternalTool>,
}

impl ExiftoolBackend {
    pub fn new(tool: Arc<dyn ExternalTool>) -> Self {
        Self { tool }
    }

    fn args(image: &ImageRef) -> Vec<OsString> {
        let mut args = os_args(["-s", "-n", "-ExposureTime", "-ISO", "-FNumber"]);
        args.push(image.path().as_os_str().to_os_string());
        args
    }

    /// Parse `Tag : value` lines. Tags exiftool cannot find are simply absent.
    fn parse(stdout: &str) -> ExposureReading {
        let mut reading = ExposureReading {
            exposure_time: None,
            iso: None,
            f_number: None,
        };
        for line in stdout.lines() {
            let Some((tag, value)) = line.split_once(':') else {
                continue;
            };
            let value = parse_exif_number(value);
            match tag.trim() {
                "ExposureTime" => reading.exposure_time = value,
                "ISO" => reading.iso = value,
                "FNumber" => reading.f_number = value,
                _ => {}
            }
        }
        reading
    }
}

#[async_trait]
impl ExposureBackend for ExiftoolBackend {
    fn name(&self) -> &'static str {
        "exiftool"
    }

    async fn read(&self, image: &ImageRef) -> PipelineResult<ExposureReading> {
        let invocation = self.tool.invoke(&Self::args(image)).await?;
        if !invocation.success() {
            return Err(unavailable(image, self.tool.name(), &invocation.stderr));
        }
        Ok(Self::parse(&invocation.stdout))
    }
}

/// Reads exposure settings with ImageMagick's `identify -format`.
pub struct IdentifyBackend {
    tool: Arc<dyn ExternalTool>,
}

impl IdentifyBackend {
    const FORMAT: &'static str =
        "%[EXIF:ExposureTime]|%[EXIF:ISOSpeedRatings]|%[EXIF:FNumber]\n";

    pub fn new(tool: Arc<dyn ExternalTool>) -> Self {
        Self { tool }
    }

    fn args(image: &ImageRef) -> Vec<OsString> {
        let mut args = os_args(["-format", Self::FORMAT]);
        args.push(image.path().as_os_str().to_os_string());
        args
    }

    /// Multi-frame files print one line per frame; the first one wins.
    fn parse(stdout: &str) -> ExposureReading {
        let line = stdout.lines().next().unwrap_or_default();
        let mut fields = line.split('|').map(parse_exif_number);
        ExposureReading {
            exposure_time: fields.next().flatten(),
            iso: fields.next().flatten(),
            f_number: fields.next().flatten(),
        }
    }
}

#[async_trait]
impl ExposureBackend for IdentifyBackend {
    fn name(&self) -> &'static str {
        "identify"
    }

    async fn read(&self, image: &ImageRef) -> PipelineResult<ExposureReading> {
        let invocation = self.tool.invoke(&Self::args(image)).await?;
        if !invocation.success() {
            return Err(unavailable(image, self.tool.name(), &invocation.stderr));
        }
        Ok(Self::parse(&invocation.stdout))
    }
}

/// Reads exposure settings in-process from the primary EXIF IFD.
pub struct NativeExifBackend;

impl NativeExifBackend {
    fn get_f64(exif: &exif::Exif, tag: Tag) -> Option<f64> {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Rational(v) => v.first().map(|r| r.to_f64()),
                Value::SRational(v) => v.first().map(|r| r.to_f64()),
                Value::Short(v) => v.first().map(|&x| f64::from(x)),
                Value::Long(v) => v.first().map(|&x| f64::from(x)),
                _ => None,
            })
    }

    /// Blocking read of the primary IFD; errors carry their origin and detail.
    fn read_file(path: &Path) -> Result<ExposureReading, (&'static str, String)> {
        let file = File::open(path).map_err(|e| ("open", e.to_string()))?;
        let mut reader = BufReader::new(file);
        let exif = Reader::new()
            .read_from_container(&mut reader)
            .map_err(|e| ("exif", e.to_string()))?;

        Ok(ExposureReading {
            exposure_time: Self::get_f64(&exif, Tag::ExposureTime),
            iso: Self::get_f64(&exif, Tag::PhotographicSensitivity),
            f_number: Self::get_f64(&exif, Tag::FNumber),
        })
    }
}

#[async_trait]
impl ExposureBackend for NativeExifBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn read(&self, image: &ImageRef) -> PipelineResult<ExposureReading> {
        let path = image.path().to_path_buf();
        let result = tokio::task::spawn_blocking(move || Self::read_file(&path))
            .await
            .map_err(|e| unavailable(image, "exif", &e.to_string()))?;
        result.map_err(|(source, detail)| unavailable(image, source, &detail))
    }
}

fn unavailable(image: &ImageRef, source: &str, detail: &str) -> PipelineError {
    PipelineError::MetadataUnavailable {
        path: image.path().to_path_buf(),
        message: format!("{source}: {}", detail.trim()),
    }
}
