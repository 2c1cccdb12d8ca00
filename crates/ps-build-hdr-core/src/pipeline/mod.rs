//! Batch processing pipeline.
//!
//! - **partition**: group input files into batches
//! - **stages**: argument construction for each external stage
//! - **runlog**: append-only log of banners and tool output
//! - **orchestrator**: runs the stages for each batch, fail-fast

pub mod orchestrator;
pub mod partition;
pub mod runlog;
pub mod stages;

// Re-exports for convenient access
pub use orchestrator::{BatchOutput, Pipeline, PipelineOptions, RunReport};
pub use partition::{explicit_batch, list_directory, partition, BatchMode};
pub use runlog::RunLog;
pub use stages::Stage;
