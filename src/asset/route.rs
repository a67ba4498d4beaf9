//! Asset route: source → output mapping.

use std::path::{Path, PathBuf};

use crate::error::ProcessError;

use super::Strategy;

/// A file to process: where it comes from, where it goes, and how.
///
/// Routes are computed per operation and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRoute {
    /// Source file path (absolute)
    pub source: PathBuf,
    /// Output file path
    pub output: PathBuf,
    /// Handling strategy for the source
    pub strategy: Strategy,
}

impl AssetRoute {
    pub fn new(source: &Path, src_root: &Path, dist_root: &Path) -> Result<Self, ProcessError> {
        Ok(Self {
            source: source.to_path_buf(),
            output: output_path(src_root, dist_root, source)?,
            strategy: Strategy::classify(source),
        })
    }
}

/// `dist_root / relative(src_root, source)`.
///
/// The relative path and file name are kept verbatim; transformations change
/// content only.
pub fn output_path(src_root: &Path, dist_root: &Path, source: &Path) -> Result<PathBuf, ProcessError> {
    let rel = source.strip_prefix(src_root).map_err(|_| {
        ProcessError::Config(format!(
            "`{}` is not inside source root `{}`",
            source.display(),
            src_root.display()
        ))
    })?;
    Ok(dist_root.join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_nested() {
        let out = output_path(
            Path::new("/site/src"),
            Path::new("/site/dist"),
            Path::new("/site/src/a/b/app.js"),
        )
        .unwrap();
        assert_eq!(out, PathBuf::from("/site/dist/a/b/app.js"));
    }

    #[test]
    fn test_output_path_keeps_name() {
        let out = output_path(
            Path::new("/s"),
            Path::new("/d"),
            Path::new("/s/Photo Final.JPEG"),
        )
        .unwrap();
        assert_eq!(out, PathBuf::from("/d/Photo Final.JPEG"));
    }

    #[test]
    fn test_output_path_outside_root() {
        let err = output_path(Path::new("/s"), Path::new("/d"), Path::new("/other/x.js")).unwrap_err();
        assert!(matches!(err, ProcessError::Config(_)));
    }

    #[test]
    fn test_route_classifies() {
        let route = AssetRoute::new(Path::new("/s/css/site.css"), Path::new("/s"), Path::new("/d"))
            .unwrap();
        assert_eq!(route.strategy, Strategy::Stylesheet);
        assert_eq!(route.output, PathBuf::from("/d/css/site.css"));
    }
}
