use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::{ChangeKind, WatchEvent};
use crate::debug;
use crate::utils::path::normalize_path;

/// Sleep used while nothing is pending.
const IDLE: Duration = Duration::from_secs(86400);

/// Coalesces raw notify events per path and releases them once the source
/// tree has been quiet for `quiet`.
pub(super) struct Debouncer {
    /// Path → latest coalesced change
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
    quiet: Duration,
    /// Subtree whose events are dropped (output root nested in the source root)
    skip: Option<PathBuf>,
    verbose: bool,
}

impl Debouncer {
    pub(super) fn new(quiet: Duration, skip: Option<PathBuf>, verbose: bool) -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            quiet,
            skip,
            verbose,
        }
    }

    /// Add a notify event, applying per-path coalescing:
    /// - Removed + Created/Modified → Created/Modified (restored)
    /// - Modified + Removed → Removed (deleted)
    /// - Created + Removed → dropped (appeared and vanished)
    /// - otherwise the first kind wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(modify) => {
                // mtime/chmod noise
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
                ChangeKind::Modified
            }
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }

            let path = normalize_path(path);
            if self.skip.as_ref().is_some_and(|skip| path.starts_with(skip)) {
                continue;
            }

            if let Some(&existing) = self.changes.get(&path) {
                match (existing, kind) {
                    (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                        debug!(self.verbose, "watch"; "restore {}->{}: {}", existing.label(), kind.label(), path.display());
                        self.changes.insert(path, kind);
                    }
                    (ChangeKind::Modified, ChangeKind::Removed) => {
                        debug!(self.verbose, "watch"; "upgrade modified->removed: {}", path.display());
                        self.changes.insert(path, ChangeKind::Removed);
                    }
                    (ChangeKind::Created, ChangeKind::Removed) => {
                        debug!(self.verbose, "watch"; "discard created+removed: {}", path.display());
                        self.changes.remove(&path);
                    }
                    _ => continue,
                }
                self.last_event = Some(Instant::now());
                continue;
            }

            debug!(self.verbose, "watch"; "event {}: {}", kind.label(), path.display());
            self.changes.insert(path, kind);
            self.last_event = Some(Instant::now());
        }
    }

    /// Take the pending batch once the quiet period has elapsed.
    ///
    /// Removals come first so a rename (remove old, create new) never
    /// deletes what the creation just wrote. Paths are sorted within a kind.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<WatchEvent>> {
        if !self.is_ready() {
            return None;
        }

        let changes = std::mem::take(&mut self.changes);
        self.last_event = None;

        let mut batch: Vec<(PathBuf, ChangeKind)> = changes.into_iter().collect();
        batch.sort_by(|(a, ak), (b, bk)| {
            let removed_first = |kind: &ChangeKind| *kind != ChangeKind::Removed;
            removed_first(ak).cmp(&removed_first(bk)).then_with(|| a.cmp(b))
        });

        Some(
            batch
                .into_iter()
                .map(|(path, kind)| kind.into_event(path))
                .collect(),
        )
    }

    pub(super) fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        last_event.elapsed() >= self.quiet && !self.changes.is_empty()
    }

    /// Precise sleep duration until the batch may be ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event.filter(|_| !self.changes.is_empty()) else {
            return IDLE;
        };

        self.quiet
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Editor swap and backup files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp") || name.ends_with('~')
}
