//! Path normalization utilities.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `relative_display` - short form of a path for log lines

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// For a path that does not exist yet:
/// - Join with current directory if relative
/// - Drop `.` and fold `..` lexically
/// - Canonicalize the deepest existing ancestor and re-append the rest
///
/// Two spellings of the same location therefore compare equal whether or
/// not the path exists.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    let lexical = lexical_normalize(&absolute);

    lexical
        .ancestors()
        .skip(1)
        .find_map(|ancestor| {
            let base = ancestor.canonicalize().ok()?;
            let rest = lexical.strip_prefix(ancestor).ok()?;
            Some(base.join(rest))
        })
        .unwrap_or(lexical)
}

/// Remove `.` components and resolve `..` against the preceding component.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Render `path` relative to `root` when possible, for log output.
pub fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
