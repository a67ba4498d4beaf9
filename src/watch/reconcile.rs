//! Applies one debounced event to the output tree.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::WatchEvent;
use crate::asset::{AssetRoute, process_file, remove_output};
use crate::config::BuildOptions;
use crate::debug;
use crate::error::ProcessError;
use crate::logger::WatchStatus;
use crate::pipeline::{BuildSummary, build_dir};
use crate::utils::path::relative_display;

/// What reconciling an event did to the output tree.
#[derive(Debug)]
pub enum Action {
    /// A single file was reprocessed.
    Processed(AssetRoute),
    /// A directory appeared and was built as a subtree.
    Built(BuildSummary),
    /// The mirrored output was deleted (`None` if there was nothing to delete).
    Removed(Option<PathBuf>),
}

/// Reconcile one event. Blocking; run it off the async executor.
///
/// Added/changed paths that no longer exist are treated as removals, since
/// the debounced event may be older than the file system state.
pub fn reconcile(event: &WatchEvent, options: &BuildOptions) -> Result<Action, ProcessError> {
    let path = event.path();
    if let WatchEvent::Removed(_) = event {
        return remove_output(path, options).map(Action::Removed);
    }

    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => build_dir(path, options).map(Action::Built),
        Ok(_) => process_file(path, options).map(Action::Processed),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            remove_output(path, options).map(Action::Removed)
        }
        Err(e) => Err(ProcessError::io(path, e)),
    }
}

/// Consume events one at a time until the sender is dropped.
///
/// Each event finishes before the next is taken, so two events for the same
/// path can never interleave. Failures are reported and never end the loop.
pub async fn run(mut events: mpsc::Receiver<WatchEvent>, options: Arc<BuildOptions>) {
    let mut status = WatchStatus::new();

    while let Some(event) = events.recv().await {
        let rel = relative_display(event.path(), &options.src);
        debug!(options.verbose, "watch"; "{}: {rel}", event.label());

        let task_options = Arc::clone(&options);
        let result = tokio::task::spawn_blocking(move || reconcile(&event, &task_options)).await;

        match result {
            Ok(Ok(action)) => report(&mut status, &rel, action, &options),
            Ok(Err(err)) => status.error(&format!("{} failed: {rel}", err.label()), &err.report()),
            Err(join) => status.error(&format!("failed: {rel}"), &join.to_string()),
        }
    }
}

fn report(status: &mut WatchStatus, rel: &str, action: Action, options: &BuildOptions) {
    match action {
        Action::Processed(route) => status.success(&format!("{}: {rel}", route.strategy)),
        Action::Built(summary) => status.success(&format!("built {rel}: {summary}")),
        Action::Removed(Some(_)) => status.success(&format!("removed: {rel}")),
        Action::Removed(None) => {
            debug!(options.verbose, "watch"; "nothing to remove for {rel}");
        }
    }
}
