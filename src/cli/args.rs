//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Mirror a source tree into minified, optionally bundled output
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source directory to compile [default: src]
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub src: Option<PathBuf>,

    /// Output directory mirroring the source tree [default: dist]
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub dist: Option<PathBuf>,

    /// Keep running and rebuild files as they change
    #[arg(short, long)]
    pub watch: bool,

    /// Remove the output directory before building
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub clean: Option<bool>,

    /// Bundle script imports into each entry file
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub bundle: Option<bool>,

    /// Module name to leave out of bundles (repeatable)
    #[arg(short, long = "external", value_name = "MODULE", action = clap::ArgAction::Append)]
    pub external: Vec<String>,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file path (read only if present, unless given explicitly)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}
