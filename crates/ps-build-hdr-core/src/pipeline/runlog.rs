//! Append-only run log receiving batch banners and raw tool output.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::tools::Invocation;
use crate::types::Batch;

const BORDER: &str = "--------------------------------------------------------------------------------";

/// The process-wide log file. Single writer, opened in append mode per write.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<File, PipelineError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| PipelineError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn append(&self, text: &str) -> Result<(), PipelineError> {
        self.open()?
            .write_all(text.as_bytes())
            .map_err(|source| PipelineError::Io {
                path: self.path.clone(),
                source,
            })
    }

    /// Write the banner that opens a batch: border, date and member files.
    pub fn banner(&self, batch: &Batch) -> Result<(), PipelineError> {
        let date = chrono::Local::now().format("%a %b %e %H:%M:%S %Y");
        self.append(&format!(
            "{BORDER}\nDate: {date}\nImages: {}\n{BORDER}\n",
            batch.describe()
        ))
    }

    /// Record one command line and everything it printed.
    pub fn record(&self, command: &str, invocation: &Invocation) -> Result<(), PipelineError> {
        let mut text = format!("$ {command}\n");
        let output = invocation.combined();
        text.push_str(&output);
        if !output.is_empty() && !output.ends_with('\n') {
            text.push('\n');
        }
        self.append(&text)
    }
}
