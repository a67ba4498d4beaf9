//! Whole-tree operations on the output root.
//!
//! ```text
//! clean_output ──► build_tree ──► collect_files ──► process_file (rayon)
//! ```

mod build;
mod clean;

pub use build::{BuildSummary, build_dir, build_tree};
pub use clean::{CleanOutcome, clean_output};
