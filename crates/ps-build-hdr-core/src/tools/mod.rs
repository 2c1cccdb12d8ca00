//! External tool capability.
//!
//! Every third-party binary the pipeline drives sits behind [`ExternalTool`],
//! so stages build argument vectors and hand them to a trait object. Tests
//! substitute recording doubles and never spawn a process.

pub mod dialect;
pub mod resolve;

pub use dialect::{FlagDialect, ToolVersion};
pub use resolve::{AlignMode, ToolResolver, ToolSet};

use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::error::ToolError;

/// Outcome of one external process invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Exit code, `None` when the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Invocation {
    /// A zero-exit invocation with the given stdout. Used by test doubles.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed invocation with the given exit code and stderr. Used by test doubles.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// stdout followed by stderr, as written to the run log.
    pub fn combined(&self) -> String {
        let mut out = String::with_capacity(self.stdout.len() + self.stderr.len());
        out.push_str(&self.stdout);
        if !self.stdout.is_empty() && !self.stdout.ends_with('\n') && !self.stderr.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.stderr);
        out
    }
}

/// A third-party program the pipeline can run.
#[async_trait]
pub trait ExternalTool: Send + Sync {
    /// Short name for diagnostics, the executable's file name.
    fn name(&self) -> &str {
        let program = self.program();
        Path::new(program)
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or(program)
    }

    /// Program as shown to the user in command lines.
    fn program(&self) -> &str;

    /// Run the program to completion with the given arguments.
    ///
    /// A non-zero exit is *not* an error here; callers inspect
    /// [`Invocation::success`]. Only a failure to start is reported as `Err`.
    /// Arguments are passed to the OS unchanged, so non-UTF-8 paths survive.
    async fn invoke(&self, args: &[OsString]) -> Result<Invocation, ToolError>;
}

/// An [`ExternalTool`] backed by a real executable.
#[derive(Debug, Clone)]
pub struct ProcessTool {
    path: PathBuf,
    display: String,
}

impl ProcessTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display = path.to_string_lossy().into_owned();
        Self { path, display }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ExternalTool for ProcessTool {
    fn program(&self) -> &str {
        &self.display
    }

    async fn invoke(&self, args: &[OsString]) -> Result<Invocation, ToolError> {
        tracing::debug!("exec: {}", render_command(&self.display, args));
        // No timeout: a hung tool blocks the run.
        let output = tokio::process::Command::new(&self.path)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                program: self.display.clone(),
                source,
            })?;

        Ok(Invocation {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Render a command line for display, single-quoting arguments that need it.
/// Non-UTF-8 bytes are shown lossily; the display is never executed.
pub fn render_command(program: &str, args: &[OsString]) -> String {
    std::iter::once(quote_arg(program))
        .chain(args.iter().map(|arg| quote_arg(&arg.to_string_lossy())))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build an argument vector from string flags and paths.
pub fn os_args<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    args.into_iter().map(|arg| arg.as_ref().to_os_string()).collect()
}

fn quote_arg(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_joins_streams() {
        let inv = Invocation {
            status: Some(1),
            stdout: "out".to_string(),
            stderr: "err\n".to_string(),
        };
        assert_eq!(inv.combined(), "out\nerr\n");
        assert!(!inv.success());
    }

    #[test]
    fn test_combined_stdout_only() {
        assert_eq!(Invocation::ok("v 2.6.0\n").combined(), "v 2.6.0\n");
    }

    #[test]
    fn test_render_command_quotes_when_needed() {
        let args = os_args(["-e", "-1,0,1", "my photo.jpg", "(gimp-quit 0)"]);
        assert_eq!(
            render_command("luminance-hdr-cli", &args),
            "luminance-hdr-cli -e -1,0,1 'my photo.jpg' '(gimp-quit 0)'"
        );
    }

    #[test]
    fn test_quote_arg_escapes_single_quote() {
        assert_eq!(quote_arg("it's"), r"'it'\''s'");
        assert_eq!(quote_arg(""), "''");
    }

    #[test]
    fn test_name_is_executable_file_name() {
        let tool = ProcessTool::new("/usr/local/bin/luminance-hdr-cli");
        assert_eq!(tool.name(), "luminance-hdr-cli");
        assert_eq!(tool.program(), "/usr/local/bin/luminance-hdr-cli");
        assert_eq!(ProcessTool::new("gimp").name(), "gimp");
    }

    #[cfg(unix)]
    #[test]
    fn test_render_command_shows_non_utf8_lossily() {
        use std::os::unix::ffi::OsStrExt;
        let args = vec![OsStr::from_bytes(b"IMG_\xff01.jpg").to_os_string()];
        assert_eq!(render_command("exiftool", &args), "exiftool 'IMG_\u{FFFD}01.jpg'");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_process_tool_passes_non_utf8_args_unchanged() {
        use std::os::unix::ffi::OsStrExt;
        let dir = tempfile::tempdir().unwrap();
        let name = OsStr::from_bytes(b"IMG_\xff01.jpg");
        let path = dir.path().join(name);
        std::fs::write(&path, b"x").unwrap();

        let tool = ProcessTool::new("/bin/sh");
        let args = os_args([OsStr::new("-c"), OsStr::new("test -f \"$0\""), path.as_os_str()]);
        let invocation = tool.invoke(&args).await.unwrap();
        assert!(invocation.success(), "{invocation:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_tool_missing_binary_is_spawn_error() {
        let tool = ProcessTool::new("/nonexistent/ps-build-hdr-tool");
        let err = tool.invoke(&[]).await.unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
