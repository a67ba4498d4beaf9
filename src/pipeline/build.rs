//! Full and subtree builds.
//!
//! Enumeration is a plain recursive `read_dir` walk; processing fans out over
//! rayon and stops at the first failing file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::asset::{Strategy, process_file};
use crate::config::BuildOptions;
use crate::debug;
use crate::error::{IoContext, ProcessError};
use crate::utils::path::relative_display;

/// Files processed per strategy in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    counts: [usize; Strategy::ALL.len()],
    pub elapsed: Duration,
}

impl BuildSummary {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn count(&self, strategy: Strategy) -> usize {
        self.counts[strategy.index()]
    }

    fn record(&mut self, strategy: Strategy) {
        self.counts[strategy.index()] += 1;
    }
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} files in {:.2?}", self.total(), self.elapsed)?;

        let parts: Vec<String> = Strategy::ALL
            .iter()
            .filter(|s| self.count(**s) > 0)
            .map(|s| format!("{} {}", self.count(*s), s.label()))
            .collect();
        if !parts.is_empty() {
            write!(f, " ({})", parts.join(", "))?;
        }
        Ok(())
    }
}

/// Build the whole source tree into the output root.
pub fn build_tree(options: &BuildOptions) -> Result<BuildSummary, ProcessError> {
    build_dir(&options.src, options)
}

/// Build every file under `dir`, which must lie inside the source root.
pub fn build_dir(dir: &Path, options: &BuildOptions) -> Result<BuildSummary, ProcessError> {
    let start = Instant::now();
    let skip = options.dist_in_src().then_some(options.dist.as_path());
    let files = collect_files(dir, skip)?;

    let summary = Mutex::new(BuildSummary::default());
    files.par_iter().try_for_each(|path| {
        let route = process_file(path, options)?;
        debug!(options.verbose, route.strategy.label(); "{}", relative_display(path, &options.src));
        summary.lock().record(route.strategy);
        Ok::<_, ProcessError>(())
    })?;

    let mut summary = summary.into_inner();
    summary.elapsed = start.elapsed();
    Ok(summary)
}

/// Every regular file under `dir`, excluding the `skip` subtree.
///
/// Symlinks are followed through `metadata`, so links to files are
/// processed like the files themselves.
pub fn collect_files(dir: &Path, skip: Option<&Path>) -> Result<Vec<PathBuf>, ProcessError> {
    let mut files = Vec::new();
    collect_into(dir, skip, &mut files)?;
    Ok(files)
}

fn collect_into(
    dir: &Path,
    skip: Option<&Path>,
    files: &mut Vec<PathBuf>,
) -> Result<(), ProcessError> {
    for entry in fs::read_dir(dir).at(dir)? {
        let path = entry.at(dir)?.path();
        if skip.is_some_and(|skip| path == skip) {
            continue;
        }

        let meta = fs::metadata(&path).at(&path)?;
        if meta.is_dir() {
            collect_into(&path, skip, files)?;
        } else if meta.is_file() {
            files.push(path);
        }
    }
    Ok(())
}
