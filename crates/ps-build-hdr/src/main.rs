//! ps-build-hdr - batch-convert bracketed exposures into tone-mapped HDR composites.
//!
//! # Usage
//!
//! ```bash
//! # Every 3 files in the current directory form one set
//! ps-build-hdr
//!
//! # Sets of 5, keeping the merged radiance maps
//! ps-build-hdr -n 5 --keep-hdr
//!
//! # One explicit set
//! ps-build-hdr IMG_0001.JPG IMG_0002.JPG IMG_0003.JPG IMG_0004.JPG
//! ```

use anyhow::Context;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

mod cli;
mod logging;

/// ps-build-hdr - tone-mapped HDR composites from bracketed exposures.
#[derive(Parser, Debug)]
#[command(name = "ps-build-hdr")]
#[command(author, version, about, long_about = cli::USAGE_HEADER)]
#[command(disable_help_flag = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json_logs: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH", env = "PS_BUILD_HDR_CONFIG")]
    config: Option<PathBuf>,

    /// Print this documentation and exit
    #[arg(short = 'h', long = "help", visible_alias = "usage", action = ArgAction::HelpLong)]
    help: Option<bool>,

    #[command(flatten)]
    run: cli::RunArgs,
}

/// Load the config file. An explicitly named file must load; the default
/// location falls back to defaults with a warning.
fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<ps_build_hdr_core::Config> {
    if let Some(path) = path {
        return ps_build_hdr_core::Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }
    // Logging isn't initialized yet, so use eprintln for config warnings.
    Ok(match ps_build_hdr_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Config file: {}",
                ps_build_hdr_core::Config::default_path().display()
            );
            ps_build_hdr_core::Config::default()
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("ps-build-hdr v{}", ps_build_hdr_core::VERSION);

    cli::run::execute(cli.run, config).await
}
