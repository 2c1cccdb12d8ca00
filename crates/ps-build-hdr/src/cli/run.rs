//! The batch run: resolve tools, collect batches, process them in order.

use std::path::{Path, PathBuf};

use ps_build_hdr_core::{BatchMode, Config, Pipeline, PipelineError, RunReport};

use super::setup::{apply_overrides, collect_batches, setup_pipeline};
use super::RunArgs;

/// Execute a run over the current directory. Any failure aborts the whole
/// run, including batches not yet started.
pub async fn execute(args: RunArgs, config: Config) -> anyhow::Result<()> {
    execute_in(args, config, Path::new(".")).await
}

/// Execute a run, scanning `dir` when no filenames are given.
pub async fn execute_in(args: RunArgs, mut config: Config, dir: &Path) -> anyhow::Result<()> {
    apply_overrides(&args, &mut config);

    let pipeline = setup_pipeline(&config).await?;
    let report = run_batches(&pipeline, &args.files, dir, config.batch.number).await?;

    for output in &report.outputs {
        println!("{}", output.display());
    }
    Ok(())
}

async fn run_batches(
    pipeline: &Pipeline,
    files: &[PathBuf],
    dir: &Path,
    number: usize,
) -> anyhow::Result<RunReport> {
    let (mode, batches) = collect_batches(files, dir, number)?;
    if batches.is_empty() {
        match mode {
            BatchMode::DirectoryScan => tracing::warn!(
                "No complete set of {number} file(s) in {}",
                dir.display()
            ),
            BatchMode::Explicit => tracing::warn!("No input files given"),
        }
        return Ok(RunReport::default());
    }
    tracing::info!("Processing {} set(s) ({mode:?} mode)", batches.len());

    let report = match pipeline.run_all(batches).await {
        Ok(report) => report,
        Err(e) => {
            if let PipelineError::StageFailure { command, .. } = &e {
                tracing::error!("Failed command: {command}");
            }
            tracing::error!("Tool output is in {}", pipeline.log().path().display());
            return Err(e.into());
        }
    };

    tracing::info!(
        "Done: {} image(s) written, {} radiance map(s) kept",
        report.outputs.len(),
        report.kept.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ps_build_hdr_core::exposure::{ExposureBackend, ExposureReading};
    use ps_build_hdr_core::tools::{AlignMode, FlagDialect, Invocation};
    use ps_build_hdr_core::{
        ExposureExtractor, ExternalTool, ImageRef, PipelineOptions, PipelineResult, RunLog,
        ToolError, ToolSet,
    };
    use std::ffi::OsString;
    use std::sync::Arc;

    /// Engine that exits with status 2 on every call.
    struct BrokenEngine;

    #[async_trait]
    impl ExternalTool for BrokenEngine {
        fn program(&self) -> &str {
            "luminance-hdr-cli"
        }

        async fn invoke(&self, _args: &[OsString]) -> Result<Invocation, ToolError> {
            Ok(Invocation::failed(2, "cannot merge"))
        }
    }

    struct FixedExposure;

    #[async_trait]
    impl ExposureBackend for FixedExposure {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn read(&self, _image: &ImageRef) -> PipelineResult<ExposureReading> {
            Ok(ExposureReading {
                exposure_time: Some(0.5),
                iso: Some(100.0),
                f_number: Some(8.0),
            })
        }
    }

    fn broken_pipeline(log: &Path) -> Pipeline {
        let tools = ToolSet {
            hdr_engine: Arc::new(BrokenEngine),
            compositor: Arc::new(BrokenEngine),
            metadata_tool: None,
            align: AlignMode::Mtb,
            dialect: FlagDialect::Modern,
        };
        Pipeline::new(
            tools,
            ExposureExtractor::new(Box::new(FixedExposure)),
            RunLog::new(log),
            PipelineOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_empty_scan_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("run.log");
        let report = run_batches(&broken_pipeline(&log), &[], dir.path(), 3)
            .await
            .unwrap();
        assert_eq!(report, RunReport::default());
        assert!(!log.exists());
    }

    #[tokio::test]
    async fn test_stage_failure_reports_command_and_log() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg", "f.jpg"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let log = dir.path().join("run.log");

        let err = run_batches(&broken_pipeline(&log), &[], dir.path(), 3)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("merge stage failed"), "{message}");
        assert!(message.contains("luminance-hdr-cli --align MTB"), "{message}");
        assert!(message.contains(&log.display().to_string()), "{message}");

        // The second set never started.
        let text = std::fs::read_to_string(&log).unwrap();
        assert_eq!(text.matches("Images: ").count(), 1);
        assert!(text.contains("cannot merge"));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_execute_in_empty_directory_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.tools.hdr_engine = "/bin/true".to_string();
        config.tools.compositor = "/bin/true".to_string();
        config.tools.align_helper = "/nonexistent/align_image_stack".to_string();
        config.tools.metadata_tool = "/nonexistent/exiftool".to_string();
        config.metadata.backend = ps_build_hdr_core::config::BackendPreference::Native;
        config.log.path = dir.path().join("run.log");

        execute_in(RunArgs::default(), config, dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_in_missing_engine_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.tools.hdr_engine = "/nonexistent/luminance-hdr-cli".to_string();

        let err = execute_in(RunArgs::default(), config, dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/luminance-hdr-cli"));
    }
}
