//! Watch mode: incremental rebuilds driven by file system events.
//!
//! ```text
//! notify ─► std mpsc ─► bridge thread ─► tokio mpsc ─► Debouncer
//!                                                         │ WatchEvent
//!                                                         ▼
//!                                             reconcile::run (one task)
//!                                                         │ spawn_blocking
//!                                                         ▼
//!                                             process_file / remove_output
//! ```
//!
//! The watcher is attached only after the initial build has finished.

mod debouncer;
mod reconcile;
mod types;


use std::sync::Arc;

use anyhow::{Context, Result};
use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::BuildOptions;
use crate::log;
use debouncer::Debouncer;

pub use types::WatchEvent;

/// Capacity of the raw and debounced event channels.
const CHANNEL_CAPACITY: usize = 64;

/// Watch the source root and reconcile changes until `shutdown` fires.
pub async fn watch(options: Arc<BuildOptions>, mut shutdown: mpsc::UnboundedReceiver<()>) -> Result<()> {
    // notify is callback based; hop through a std channel
    let (notify_tx, notify_rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = notify_tx.send(res);
    })
    .context("failed to create file watcher")?;
    watcher
        .watch(&options.src, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch `{}`", options.src.display()))?;

    let (raw_tx, mut raw_rx) = mpsc::channel::<notify::Event>(CHANNEL_CAPACITY);
    std::thread::spawn(move || {
        while let Ok(result) = notify_rx.recv() {
            match result {
                Ok(event) => {
                    if raw_tx.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(e) => log!("watch"; "notify error: {e}"),
            }
        }
    });

    let (events_tx, events_rx) = mpsc::channel::<WatchEvent>(CHANNEL_CAPACITY);
    let reconciler = tokio::spawn(reconcile::run(events_rx, Arc::clone(&options)));

    let skip = options.dist_in_src().then(|| options.dist.clone());
    let mut debouncer = Debouncer::new(options.debounce, skip, options.verbose);

    log!("watch"; "watching `{}` for changes (Ctrl+C to stop)", options.src.display());

    'session: loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            Some(event) = raw_rx.recv() => debouncer.add_event(&event),
            _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                let Some(batch) = debouncer.take_if_ready() else {
                    continue;
                };
                for event in batch {
                    if events_tx.send(event).await.is_err() {
                        break 'session;
                    }
                }
            }
        }
    }

    log!("watch"; "stopped");
    drop(watcher);
    drop(events_tx);
    reconciler.abort();
    Ok(())
}
