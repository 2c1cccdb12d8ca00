//! Run setup: config overrides, tool resolution, pipeline assembly.

use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::Context;
use ps_build_hdr_core::pipeline::{explicit_batch, list_directory, partition};
use ps_build_hdr_core::{
    Batch, BatchMode, Config, ExposureExtractor, ImageRef, Pipeline, PipelineOptions, RunLog,
    ToolResolver,
};

use super::RunArgs;

/// Apply CLI overrides on top of the loaded configuration.
pub fn apply_overrides(args: &RunArgs, config: &mut Config) {
    if let Some(number) = args.number {
        config.batch.number = number.get();
    }
    if args.keep_hdr {
        config.batch.keep_hdr = true;
    }
}

/// Resolve every external tool and assemble the pipeline.
///
/// Fails before any batch is touched when a mandatory tool or every
/// metadata backend is missing.
pub async fn setup_pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    let resolver = ToolResolver::new(config.tools.clone());
    let tools = resolver.resolve().await?;
    tracing::debug!("Tools: {tools:?}");

    let extractor = ExposureExtractor::select(config.metadata.backend, &resolver)?;
    tracing::info!("Reading exposure metadata with {}", extractor.backend_name());

    let log = RunLog::new(config.log_path());
    let options = PipelineOptions {
        keep_intermediate: config.batch.keep_hdr,
        ..PipelineOptions::default()
    };
    Ok(Pipeline::new(tools, extractor, log, options))
}

/// Work out the batches for this run.
///
/// Explicit filenames form one batch of any size; otherwise `dir` is listed
/// and cut into complete groups of `number`.
pub fn collect_batches(
    files: &[std::path::PathBuf],
    dir: &Path,
    number: usize,
) -> anyhow::Result<(BatchMode, Vec<Batch>)> {
    if files.is_empty() {
        let number = NonZeroUsize::new(number).context("batch size must be > 0")?;
        let images = list_directory(dir)
            .with_context(|| format!("Failed to list directory {}", dir.display()))?;
        tracing::info!("Found {} file(s) in {}", images.len(), dir.display());
        return Ok((BatchMode::DirectoryScan, partition(images, number).collect()));
    }

    if let Some(missing) = files.iter().find(|f| !f.exists()) {
        anyhow::bail!(
            "Input file does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            missing
        );
    }
    let images: Vec<ImageRef> = files.iter().cloned().map(ImageRef::from).collect();
    Ok((BatchMode::Explicit, explicit_batch(images).into_iter().collect()))
}
