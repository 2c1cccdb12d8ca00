//! Pipeline orchestration - runs the ordered external stages for each batch.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::exposure::{EvWindow, ExposureExtractor};
use crate::tools::{render_command, ExternalTool, ToolSet};
use crate::types::Batch;

use super::runlog::RunLog;
use super::stages::{
    composite_args, merge_args, metadata_copy_args, tonemap_args, Stage, ASHIKHMIN, MANTIUK08,
    OUTPUT_SUFFIX, RADIANCE_SUFFIX,
};

/// Options for controlling batch processing behavior.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Keep the merged radiance map instead of discarding it with the temp dir
    pub keep_intermediate: bool,
    /// Where a kept radiance map is moved to
    pub keep_dir: PathBuf,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            keep_intermediate: false,
            keep_dir: PathBuf::from("."),
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Composite images, one per batch, in processing order
    pub outputs: Vec<PathBuf>,
    /// Radiance maps moved out of the temp dir
    pub kept: Vec<PathBuf>,
}

/// Artifacts produced by one successful batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutput {
    pub output: PathBuf,
    pub radiance_map: Option<PathBuf>,
}

/// Runs merge → tone-map A → tone-map B → composite for each batch.
pub struct Pipeline {
    tools: ToolSet,
    extractor: ExposureExtractor,
    log: RunLog,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        tools: ToolSet,
        extractor: ExposureExtractor,
        log: RunLog,
        options: PipelineOptions,
    ) -> Self {
        Self {
            tools,
            extractor,
            log,
            options,
        }
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    /// Process batches in order, stopping at the first failure.
    pub async fn run_all<I>(&self, batches: I) -> PipelineResult<RunReport>
    where
        I: IntoIterator<Item = Batch>,
    {
        let mut report = RunReport::default();
        for (index, batch) in batches.into_iter().enumerate() {
            tracing::info!("Batch {}: {}", index + 1, batch.describe());
            let produced = self.run(&batch).await?;
            report.outputs.push(produced.output);
            report.kept.extend(produced.radiance_map);
        }
        Ok(report)
    }

    /// Process one batch.
    ///
    /// The per-batch temp dir is removed on every exit path; a kept radiance
    /// map is moved out of it first.
    pub async fn run(&self, batch: &Batch) -> PipelineResult<BatchOutput> {
        let start = std::time::Instant::now();
        self.log.banner(batch)?;

        let samples = self.extractor.sample_batch(batch).await?;
        let window = EvWindow::from_samples(&samples);
        let evs = window
            .values_for(batch)
            .ok_or_else(|| PipelineError::MetadataUnavailable {
                path: batch.first().path().to_path_buf(),
                message: "exposure value missing from batch window".to_string(),
            })?;

        let workdir = tempfile::Builder::new()
            .prefix("ps-build-hdr")
            .tempdir()
            .map_err(|source| PipelineError::Io {
                path: std::env::temp_dir(),
                source,
            })?;
        let radiance = workdir.path().join("hdr.exr");
        let overlay = workdir.path().join("ashikhmin.jpg");
        let base = workdir.path().join("mantiuk08.jpg");
        let output = batch.first().sibling_with_suffix(OUTPUT_SUFFIX);

        let engine = self.tools.hdr_engine.as_ref();
        let dialect = self.tools.dialect;
        self.stage(
            Stage::Merge,
            engine,
            merge_args(dialect, self.tools.align, &evs, &radiance, batch),
        )
        .await?;
        self.stage(
            Stage::ToneMapA,
            engine,
            tonemap_args(dialect, &radiance, &ASHIKHMIN, &overlay),
        )
        .await?;
        self.stage(
            Stage::ToneMapB,
            engine,
            tonemap_args(dialect, &radiance, &MANTIUK08, &base),
        )
        .await?;
        self.stage(
            Stage::Composite,
            self.tools.compositor.as_ref(),
            composite_args(&base, &overlay, &output),
        )
        .await?;

        let radiance_map = if self.options.keep_intermediate {
            let kept = self
                .options
                .keep_dir
                .join(format!("{}{}", batch.first().stem(), RADIANCE_SUFFIX));
            move_file(&radiance, &kept)?;
            tracing::info!("Kept radiance map: {}", kept.display());
            Some(kept)
        } else {
            None
        };

        if let Err(e) = workdir.close() {
            tracing::warn!("Failed to remove temporary directory: {e}");
        }

        self.copy_metadata(batch, &output).await;

        tracing::info!("Wrote {} in {:?}", output.display(), start.elapsed());
        Ok(BatchOutput {
            output,
            radiance_map,
        })
    }

    /// Run one stage, capture its output in the run log, fail on non-zero exit.
    async fn stage(
        &self,
        stage: Stage,
        tool: &dyn ExternalTool,
        args: Vec<OsString>,
    ) -> PipelineResult<()> {
        let command = render_command(tool.program(), &args);
        tracing::debug!("{stage}: {command}");

        let invocation = tool.invoke(&args).await?;
        self.log.record(&command, &invocation)?;

        if invocation.success() {
            Ok(())
        } else {
            Err(PipelineError::StageFailure {
                stage: stage.to_string(),
                command,
                status: invocation.status,
                log_path: self.log.path().to_path_buf(),
            })
        }
    }

    /// Copy metadata from the first input onto the output. Failures only warn.
    async fn copy_metadata(&self, batch: &Batch, output: &Path) {
        let Some(tool) = self.tools.metadata_tool.as_deref() else {
            return;
        };
        let args = metadata_copy_args(batch.first().path(), output);
        if let Err(e) = self.stage(Stage::MetadataCopy, tool, args).await {
            tracing::warn!("Could not copy metadata to {}: {e}", output.display());
        }
    }
}

/// Move a file, falling back to copy + remove across filesystems.
fn move_file(from: &Path, to: &Path) -> PipelineResult<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to).map_err(|source| PipelineError::Io {
        path: to.to_path_buf(),
        source,
    })?;
    std::fs::remove_file(from).map_err(|source| PipelineError::Io {
        path: from.to_path_buf(),
        source,
    })
}
