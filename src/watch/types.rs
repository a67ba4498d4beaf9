use std::path::{Path, PathBuf};

/// What the watcher saw happen to a path (internal, pre-debounce)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }

    pub(super) fn into_event(self, path: PathBuf) -> WatchEvent {
        match self {
            Self::Created => WatchEvent::Added(path),
            Self::Modified => WatchEvent::Changed(path),
            Self::Removed => WatchEvent::Removed(path),
        }
    }
}

/// A debounced change under the source root, delivered to the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Added(PathBuf),
    Changed(PathBuf),
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::Added(path) | Self::Changed(path) | Self::Removed(path) => path,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Added(_) => "added",
            Self::Changed(_) => "changed",
            Self::Removed(_) => "removed",
        }
    }
}
