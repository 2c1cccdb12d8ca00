//! Startup tool resolution.
//!
//! Mandatory binaries (HDR engine, compositor) must be on the search path.
//! Optional ones (alignment helper, metadata tool) only degrade the run.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ToolsConfig;
use crate::error::ToolError;

use super::dialect::{FlagDialect, ToolVersion};
use super::{ExternalTool, ProcessTool};

/// Exposure alignment performed by the HDR engine before merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignMode {
    /// Feature-based, needs the alignment helper binary
    Ais,
    /// Median-threshold-bitmap, pixel based, built into the engine
    Mtb,
}

impl AlignMode {
    pub fn as_arg(self) -> &'static str {
        match self {
            Self::Ais => "AIS",
            Self::Mtb => "MTB",
        }
    }
}

impl fmt::Display for AlignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// Process-wide tool handles, built once at startup.
#[derive(Clone)]
pub struct ToolSet {
    pub hdr_engine: Arc<dyn ExternalTool>,
    pub compositor: Arc<dyn ExternalTool>,
    /// Copies metadata onto outputs; `None` disables that step
    pub metadata_tool: Option<Arc<dyn ExternalTool>>,
    pub align: AlignMode,
    pub dialect: FlagDialect,
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSet")
            .field("hdr_engine", &self.hdr_engine.program())
            .field("compositor", &self.compositor.program())
            .field(
                "metadata_tool",
                &self.metadata_tool.as_ref().map(|t| t.program().to_string()),
            )
            .field("align", &self.align)
            .field("dialect", &self.dialect)
            .finish()
    }
}

/// Locates external programs on a search path.
#[derive(Debug, Clone)]
pub struct ToolResolver {
    tools: ToolsConfig,
    search_path: OsString,
}

impl ToolResolver {
    /// Resolver over the process `PATH`.
    pub fn new(tools: ToolsConfig) -> Self {
        let search_path = std::env::var_os("PATH").unwrap_or_default();
        Self::with_search_path(tools, search_path)
    }

    /// Resolver over an explicit search path.
    pub fn with_search_path(tools: ToolsConfig, search_path: impl Into<OsString>) -> Self {
        Self {
            tools,
            search_path: search_path.into(),
        }
    }

    pub fn tools(&self) -> &ToolsConfig {
        &self.tools
    }

    /// Find an executable by name. Names containing a path separator are
    /// checked as given instead of being searched for.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        let candidate = Path::new(name);
        if candidate.components().count() > 1 {
            return is_executable(candidate).then(|| candidate.to_path_buf());
        }
        std::env::split_paths(&self.search_path)
            .map(|dir| dir.join(name))
            .find(|path| is_executable(path))
    }

    /// Find a mandatory executable.
    pub fn require(&self, name: &str) -> Result<PathBuf, ToolError> {
        self.locate(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// Resolve the full tool set, probing the engine's flag dialect.
    pub async fn resolve(&self) -> Result<ToolSet, ToolError> {
        let mut tools = self.locate_all()?;
        tools.dialect = detect_dialect(tools.hdr_engine.as_ref()).await;
        Ok(tools)
    }

    /// Locate every tool without running any of them. The dialect is left at
    /// its default.
    pub fn locate_all(&self) -> Result<ToolSet, ToolError> {
        let engine_path = self.require(&self.tools.hdr_engine)?;
        let compositor_path = self.require(&self.tools.compositor)?;
        tracing::debug!("HDR engine: {}", engine_path.display());
        tracing::debug!("Compositor: {}", compositor_path.display());

        let align = if self.locate(&self.tools.align_helper).is_some() {
            AlignMode::Ais
        } else {
            tracing::warn!(
                "{} not found; falling back to {} alignment, results may be less accurate",
                self.tools.align_helper,
                AlignMode::Mtb
            );
            AlignMode::Mtb
        };

        let metadata_tool = match self.locate(&self.tools.metadata_tool) {
            Some(path) => Some(Arc::new(ProcessTool::new(path)) as Arc<dyn ExternalTool>),
            None => {
                tracing::warn!(
                    "{} not found; output images will not carry the source metadata",
                    self.tools.metadata_tool
                );
                None
            }
        };

        Ok(ToolSet {
            hdr_engine: Arc::new(ProcessTool::new(engine_path)),
            compositor: Arc::new(ProcessTool::new(compositor_path)),
            metadata_tool,
            align,
            dialect: FlagDialect::default(),
        })
    }
}

/// Ask the engine for its version and pick the matching flag dialect.
pub async fn detect_dialect(engine: &dyn ExternalTool) -> FlagDialect {
    let version = match engine.invoke(&[OsString::from("--version")]).await {
        Ok(invocation) => ToolVersion::parse_from_output(&invocation.combined()),
        Err(e) => {
            tracing::warn!("Could not query {} version: {e}", engine.program());
            None
        }
    };
    match version {
        Some(v) => {
            let dialect = FlagDialect::for_version(Some(v));
            tracing::debug!("{} {v}: {dialect:?} flag dialect", engine.program());
            dialect
        }
        None => {
            let dialect = FlagDialect::default();
            tracing::warn!(
                "Could not detect {} version; assuming {dialect:?} flags",
                engine.program()
            );
            dialect
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Invocation;
    use async_trait::async_trait;

    struct VersionTool(Result<Invocation, ()>);

    #[async_trait]
    impl ExternalTool for VersionTool {
        fn program(&self) -> &str {
            "engine"
        }

        async fn invoke(&self, _args: &[OsString]) -> Result<Invocation, ToolError> {
            self.0.clone().map_err(|_| ToolError::Spawn {
                program: "engine".to_string(),
                source: std::io::Error::other("boom"),
            })
        }
    }

    #[cfg(unix)]
    fn install(dir: &Path, name: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_searches_path_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        install(second.path(), "gimp");
        let path = std::env::join_paths([first.path(), second.path()]).unwrap();
        let resolver = ToolResolver::with_search_path(ToolsConfig::default(), path);

        assert_eq!(resolver.locate("gimp"), Some(second.path().join("gimp")));
        assert_eq!(resolver.locate("exiftool"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_skips_non_executable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gimp"), "not a program").unwrap();
        let resolver = ToolResolver::with_search_path(ToolsConfig::default(), dir.path());
        assert_eq!(resolver.locate("gimp"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        install(dir.path(), "my-gimp");
        let resolver = ToolResolver::with_search_path(ToolsConfig::default(), "");
        let explicit = dir.path().join("my-gimp");
        assert_eq!(
            resolver.locate(explicit.to_str().unwrap()),
            Some(explicit.clone())
        );
    }

    #[tokio::test]
    async fn test_resolve_fails_without_engine() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ToolResolver::with_search_path(ToolsConfig::default(), dir.path());
        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(ref name) if name == "luminance-hdr-cli"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_fails_without_compositor() {
        let dir = tempfile::tempdir().unwrap();
        install(dir.path(), "luminance-hdr-cli");
        let resolver = ToolResolver::with_search_path(ToolsConfig::default(), dir.path());
        let err = resolver.locate_all().unwrap_err();
        assert!(matches!(err, ToolError::NotFound(ref name) if name == "gimp"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_degrades_without_optional_tools() {
        let dir = tempfile::tempdir().unwrap();
        install(dir.path(), "luminance-hdr-cli");
        install(dir.path(), "gimp");
        let resolver = ToolResolver::with_search_path(ToolsConfig::default(), dir.path());
        let tools = resolver.locate_all().unwrap();
        assert_eq!(tools.align, AlignMode::Mtb);
        assert!(tools.metadata_tool.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_uses_optional_tools_when_present() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["luminance-hdr-cli", "gimp", "align_image_stack", "exiftool"] {
            install(dir.path(), name);
        }
        let resolver = ToolResolver::with_search_path(ToolsConfig::default(), dir.path());
        let tools = resolver.locate_all().unwrap();
        assert_eq!(tools.align, AlignMode::Ais);
        assert!(tools.metadata_tool.is_some());
    }

    #[tokio::test]
    async fn test_detect_dialect_from_version_output() {
        let legacy = VersionTool(Ok(Invocation::ok("luminance-hdr-cli 2.0.1\n")));
        assert_eq!(detect_dialect(&legacy).await, FlagDialect::Legacy);

        let modern = VersionTool(Ok(Invocation::failed(1, "Luminance HDR 2.6.1\n")));
        assert_eq!(detect_dialect(&modern).await, FlagDialect::Modern);
    }

    #[tokio::test]
    async fn test_detect_dialect_falls_back_to_default() {
        let broken = VersionTool(Err(()));
        assert_eq!(detect_dialect(&broken).await, FlagDialect::Modern);

        let silent = VersionTool(Ok(Invocation::ok("")));
        assert_eq!(detect_dialect(&silent).await, FlagDialect::Modern);
    }
}
