//! Output root removal before a build.

use std::fs;
use std::io::ErrorKind;

use crate::config::BuildOptions;
use crate::log;

/// What `clean_output` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanOutcome {
    Removed,
    /// Nothing to remove.
    Missing,
    /// Refused: the output root equals or contains the source root.
    Guarded,
    /// Removal failed and was logged.
    Failed,
}

/// Remove the output root. Best-effort: failures are logged, never returned.
pub fn clean_output(options: &BuildOptions) -> CleanOutcome {
    if options.src.starts_with(&options.dist) {
        log!("clean"; "skipped: `{}` contains the source root", options.dist.display());
        return CleanOutcome::Guarded;
    }

    match fs::remove_dir_all(&options.dist) {
        Ok(()) => CleanOutcome::Removed,
        Err(e) if e.kind() == ErrorKind::NotFound => CleanOutcome::Missing,
        Err(e) => {
            log!("clean"; "failed to remove `{}`: {e}", options.dist.display());
            CleanOutcome::Failed
        }
    }
}
