//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ProcessError;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("source root `{}` does not exist or cannot be read", .0.display())]
    MissingSource(PathBuf, #[source] std::io::Error),

    #[error("source root `{}` is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

impl From<ConfigError> for ProcessError {
    fn from(err: ConfigError) -> Self {
        let message = match std::error::Error::source(&err) {
            Some(source) => format!("{err}: {source}"),
            None => err.to_string(),
        };
        ProcessError::Config(message)
    }
}
