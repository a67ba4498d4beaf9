//! Pipeline error taxonomy.
//!
//! Every failure the pipeline can report falls into one of four classes.
//! The class decides how the caller reacts: a one-shot build aborts on any
//! of them, while watch mode logs file-level failures and keeps going.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    /// Invalid run configuration, detected before any work starts.
    #[error("{0}")]
    Config(String),

    /// Bundling hit an import that is neither resolvable nor external.
    #[error(
        "could not resolve \"{specifier}\" imported by `{}`\n  \
         hint: install the module, or keep it out of the bundle with `--external {specifier}`",
        importer.display()
    )]
    UnresolvedModule {
        specifier: String,
        importer: PathBuf,
    },

    /// A minifier or the bundler rejected the input.
    #[error("failed to transform `{}`:\n{message}", path.display())]
    Transform { path: PathBuf, message: String },

    #[error("IO error on `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a transform error from a list of diagnostics.
    pub fn transform<I, S>(path: &Path, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let message = messages
            .into_iter()
            .map(|m| format!("  {}", m.as_ref()))
            .collect::<Vec<_>>()
            .join("\n");
        Self::Transform {
            path: path.to_path_buf(),
            message,
        }
    }

    /// Message followed by its source chain, one cause per line.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str(&format!("\n  caused by: {cause}"));
            source = cause.source();
        }
        out
    }

    /// Short label used in log prefixes.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::UnresolvedModule { .. } => "unresolved",
            Self::Transform { .. } => "transform",
            Self::Io { .. } => "io",
        }
    }
}

/// Attach a path to `io::Result` values.
pub trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T, ProcessError>;
}

impl<T> IoContext<T> for io::Result<T> {
    #[inline]
    fn at(self, path: &Path) -> Result<T, ProcessError> {
        self.map_err(|e| ProcessError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_message_has_hint() {
        let err = ProcessError::UnresolvedModule {
            specifier: "lodash".into(),
            importer: PathBuf::from("src/a/app.js"),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"lodash\""));
        assert!(msg.contains("--external lodash"));
        assert_eq!(err.label(), "unresolved");
    }

    #[test]
    fn test_transform_joins_messages() {
        let err = ProcessError::transform(Path::new("style.css"), ["first", "second"]);
        let msg = err.to_string();
        assert!(msg.contains("  first\n  second"));
    }

    #[test]
    fn test_io_context() {
        let res: io::Result<()> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = res.at(Path::new("missing.txt")).unwrap_err();
        assert!(matches!(err, ProcessError::Io { .. }));
        assert!(err.to_string().contains("missing.txt"));
        assert!(err.report().ends_with("caused by: gone"));
    }
}
