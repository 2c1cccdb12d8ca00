//! Command-line arguments and the run command.

pub mod run;
mod setup;

use clap::Args;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Documentation header printed by `-h`, `--help` and `--usage`.
pub const USAGE_HEADER: &str = "\
Batch-convert bracketed exposures into tone-mapped HDR composites.

With no FILENAME arguments, every entry in the current directory is taken in
lexicographic order and grouped into consecutive sets of N (default 3); a
trailing incomplete set is skipped. The directory should contain only the
photos to process. With FILENAME arguments, all of them form a single set.

Each set is merged into a radiance map, tone-mapped twice (ashikhmin and
mantiuk08), and the two renderings are layered into <first>_HDR.jpg next to
the first input of the set.

Required tools: luminance-hdr-cli, gimp, and exiftool or ImageMagick identify.
Optional: align_image_stack (better alignment), exiftool (keeps metadata).

Raw tool output is appended to ~/.ps-build-hdr.log.";

/// Arguments for a batch run.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Images per set in directory-scan mode
    #[arg(short, long, value_name = "N")]
    pub number: Option<NonZeroUsize>,

    /// Keep the merged radiance map as <first>_HDR.exr in the current directory
    #[arg(short, long)]
    pub keep_hdr: bool,

    /// Process exactly these files as one set instead of scanning the directory
    #[arg(value_name = "FILENAME")]
    pub files: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_default_is_directory_scan() {
        let args = RunArgs::default();
        assert!(args.files.is_empty());
        assert!(args.number.is_none());
        assert!(!args.keep_hdr);
    }
}
