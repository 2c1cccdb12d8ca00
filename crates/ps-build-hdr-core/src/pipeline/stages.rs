//! Stage definitions and argument construction for the external tools.
//!
//! Parameter values here are a compatibility contract with the engine and
//! the compositor and are not configurable.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;

use crate::tools::{os_args, AlignMode, FlagDialect};
use crate::types::Batch;

/// Suffix replacing the first input's extension to name the output.
pub const OUTPUT_SUFFIX: &str = "_HDR.jpg";

/// Suffix replacing the first input's extension to name a kept radiance map.
pub const RADIANCE_SUFFIX: &str = "_HDR.exr";

/// Merge weighting, response curve and model.
pub const MERGE_CONFIG: &str = "weight=gaussian:response_curve=gamma:model=debevec";

/// Opacity (percent) of the overlay layer in the composite.
pub const OVERLAY_OPACITY: u32 = 40;

/// Blend mode of the overlay layer in the composite.
pub const OVERLAY_MODE: &str = "OVERLAY-MODE";

/// Name of the script-fu procedure defined for the composite stage.
const COMPOSITE_PROC: &str = "ps-build-hdr-composite";

/// One external invocation in a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Merge,
    ToneMapA,
    ToneMapB,
    Composite,
    MetadataCopy,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Merge => "merge",
            Stage::ToneMapA => "tone-map A (ashikhmin)",
            Stage::ToneMapB => "tone-map B (mantiuk08)",
            Stage::Composite => "composite",
            Stage::MetadataCopy => "metadata copy",
        };
        f.write_str(name)
    }
}

/// A tone-mapping operator with fixed parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneMapProfile {
    pub operator: &'static str,
    pub params: &'static [(&'static str, &'static str)],
}

impl ToneMapProfile {
    /// `key=value` pairs joined with `:`.
    pub fn params_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// Local-contrast-free operator used as the overlay layer.
pub const ASHIKHMIN: ToneMapProfile = ToneMapProfile {
    operator: "ashikhmin",
    params: &[("localcontrast", "0"), ("eq", "4"), ("simple", "false")],
};

/// Operator used as the base layer.
pub const MANTIUK08: ToneMapProfile = ToneMapProfile {
    operator: "mantiuk08",
    params: &[
        ("colorsaturation", "1"),
        ("contrastenhancement", "1"),
        ("luminancelevel", "1"),
        ("setluminance", "false"),
    ],
};

fn path_arg(path: &Path) -> OsString {
    path.as_os_str().to_os_string()
}

/// Comma-joined EV list, one value per input in input order.
pub fn ev_list(evs: &[f64]) -> String {
    evs.iter()
        .map(|ev| ev.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Arguments for the merge stage.
pub fn merge_args(
    dialect: FlagDialect,
    align: AlignMode,
    evs: &[f64],
    output: &Path,
    batch: &Batch,
) -> Vec<OsString> {
    let mut args = os_args([
        dialect.align(),
        align.as_arg(),
        dialect.merge_config(),
        MERGE_CONFIG,
    ]);
    args.extend([
        dialect.output().into(),
        path_arg(output),
        dialect.ev_list().into(),
        ev_list(evs).into(),
    ]);
    args.extend(batch.images().iter().map(|image| path_arg(image.path())));
    args
}

/// Arguments for a single-image tone-map stage.
pub fn tonemap_args(
    dialect: FlagDialect,
    radiance_map: &Path,
    profile: &ToneMapProfile,
    output: &Path,
) -> Vec<OsString> {
    vec![
        dialect.load().into(),
        path_arg(radiance_map),
        dialect.operator().into(),
        profile.operator.into(),
        dialect.operator_params().into(),
        profile.params_string().into(),
        dialect.output().into(),
        path_arg(output),
    ]
}

/// Quote a path as a Scheme string literal. Script-fu strings are text, so
/// non-UTF-8 bytes are replaced.
fn scheme_string(path: &Path) -> String {
    let escaped = path
        .to_string_lossy()
        .replace('\\', "\\\\")
        .replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Script-fu definition of the composite procedure.
pub fn composite_macro() -> String {
    format!(
        "(define ({COMPOSITE_PROC} base-file overlay-file out-file) \
           (let* ((image (car (gimp-file-load RUN-NONINTERACTIVE base-file base-file))) \
                  (overlay (car (gimp-file-load-layer RUN-NONINTERACTIVE image overlay-file)))) \
             (gimp-image-insert-layer image overlay 0 -1) \
             (gimp-layer-set-opacity overlay {OVERLAY_OPACITY}) \
             (gimp-layer-set-mode overlay {OVERLAY_MODE}) \
             (let ((flat (car (gimp-image-flatten image)))) \
               (gimp-file-save RUN-NONINTERACTIVE image flat out-file out-file)) \
             (gimp-image-delete image)))"
    )
}

/// Arguments for the composite stage: non-interactive batch mode running the
/// macro definition, one call of it, and a quit.
pub fn composite_args(base: &Path, overlay: &Path, output: &Path) -> Vec<OsString> {
    os_args([
        "-i".to_string(),
        "-b".to_string(),
        composite_macro(),
        "-b".to_string(),
        format!(
            "({COMPOSITE_PROC} {} {} {})",
            scheme_string(base),
            scheme_string(overlay),
            scheme_string(output)
        ),
        "-b".to_string(),
        "(gimp-quit 0)".to_string(),
    ])
}

/// Arguments for copying metadata from the first input onto the output.
pub fn metadata_copy_args(source: &Path, target: &Path) -> Vec<OsString> {
    vec![
        "-overwrite_original".into(),
        "-TagsFromFile".into(),
        path_arg(source),
        path_arg(target),
    ]
}
