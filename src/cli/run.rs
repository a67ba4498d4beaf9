//! Run controller: clean, initial build, then exit or watch.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use super::Cli;
use crate::config::BuildOptions;
use crate::error::ProcessError;
use crate::pipeline::{BuildSummary, CleanOutcome, build_tree, clean_output};
use crate::{debug, log, watch};

/// Resolve options from the command line and run.
///
/// Invalid configuration is reported and mapped to a failing exit code
/// before anything is cleaned, built or watched.
pub fn run_cli(cli: &Cli) -> Result<ExitCode> {
    match BuildOptions::load(cli) {
        Ok(options) => run(options),
        Err(err) => {
            log!("error"; "{}", ProcessError::from(err).report());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Execute one run with resolved options.
///
/// A one-shot run maps the build result to the exit code. In watch mode a
/// failed initial build is reported and the session starts anyway, since a
/// later edit may fix it.
pub fn run(options: BuildOptions) -> Result<ExitCode> {
    if options.clean {
        clean(&options);
    }

    let initial = initial_build(&options);

    if !options.watch {
        return Ok(if initial.is_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    serve_watch(options)?;
    Ok(ExitCode::SUCCESS)
}

/// Clean never stops the run; a refused or failed clean builds over the
/// existing output.
fn clean(options: &BuildOptions) {
    match clean_output(options) {
        CleanOutcome::Removed => log!("clean"; "removed `{}`", options.dist.display()),
        CleanOutcome::Missing => {
            debug!(options.verbose, "clean"; "nothing to remove at `{}`", options.dist.display());
        }
        CleanOutcome::Guarded | CleanOutcome::Failed => {
            log!("clean"; "building over the existing output");
        }
    }
}

fn initial_build(options: &BuildOptions) -> Result<BuildSummary, ProcessError> {
    log!("build"; "`{}` -> `{}`", options.src.display(), options.dist.display());

    build_tree(options)
        .inspect(|summary| log!("build"; "{summary}"))
        .inspect_err(|err| log!("error"; "{}", err.report()))
}

/// Run the watch session on a fresh tokio runtime until Ctrl+C.
fn serve_watch(options: BuildOptions) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })
    .context("failed to set Ctrl+C handler")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(watch::watch(Arc::new(options), shutdown_rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn code(exit: ExitCode) -> String {
        format!("{exit:?}")
    }

    fn setup(files: &[(&str, &str)]) -> (TempDir, BuildOptions) {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        for (rel, content) in files {
            let path = src.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        fs::create_dir_all(&src).unwrap();
        let options = BuildOptions::new(src, dir.path().join("dist"))
            .resolve()
            .unwrap();
        (dir, options)
    }

    #[test]
    fn test_one_shot_success() {
        let (_dir, options) = setup(&[("index.html", "<p>  hi  </p>"), ("a.txt", "a")]);
        let exit = run(options.clone()).unwrap();
        assert_eq!(code(exit), code(ExitCode::SUCCESS));
        assert!(options.dist.join("a.txt").exists());
    }

    #[test]
    fn test_one_shot_failure() {
        let (_dir, options) = setup(&[("style.css", ".a { color: red }\n..b { color: blue }\n")]);
        let exit = run(options.clone()).unwrap();
        assert_eq!(code(exit), code(ExitCode::FAILURE));
        assert!(!options.dist.join("style.css").exists());
    }

    #[test]
    fn test_clean_removes_stale_output() {
        let (_dir, options) = setup(&[("a.txt", "a")]);
        fs::create_dir_all(&options.dist).unwrap();
        fs::write(options.dist.join("stale.txt"), "old").unwrap();

        let exit = run(options.clone().with_clean(true)).unwrap();
        assert_eq!(code(exit), code(ExitCode::SUCCESS));
        assert!(!options.dist.join("stale.txt").exists());
        assert!(options.dist.join("a.txt").exists());
    }

    #[test]
    fn test_guarded_clean_still_builds() {
        let (dir, options) = setup(&[("a.txt", "a")]);
        let options = BuildOptions::new(&options.src, dir.path())
            .with_clean(true)
            .resolve()
            .unwrap();

        let exit = run(options.clone()).unwrap();
        assert_eq!(code(exit), code(ExitCode::SUCCESS));
        assert!(options.src.join("a.txt").exists());
        assert!(options.dist.join("a.txt").exists());
    }

    #[test]
    fn test_config_error_fails() {
        let dir = TempDir::new().unwrap();
        let cli = Cli {
            src: Some(dir.path().join("missing")),
            dist: Some(dir.path().join("dist")),
            ..Cli::default()
        };
        let exit = run_cli(&cli).unwrap();
        assert_eq!(code(exit), code(ExitCode::FAILURE));
        assert!(!dir.path().join("dist").exists());
    }
}
