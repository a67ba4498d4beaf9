//! assetflow - mirror a source tree into minified, optionally bundled output.

mod asset;
mod bundle;
mod cli;
mod config;
mod error;
mod logger;
mod pipeline;
mod utils;
mod watch;

use std::process::ExitCode;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::Cli;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    cli::run::run_cli(&cli)
}
