//! Build options for `assetflow.toml`.
//!
//! Options are resolved once per run: defaults, then the config file (if
//! any), then CLI flags. The result is immutable and passed by reference to
//! every component.
//!
//! ```toml
//! [build]
//! src = "src"                 # source root
//! dist = "dist"               # output root
//! bundle = false              # inline script imports
//! clean = false               # remove dist before building
//! external = ["lodash"]       # modules left out of bundles
//!
//! [watch]
//! debounce_ms = 300           # quiet period before a change is reported
//! ```

mod error;

pub use error::ConfigError;

use crate::{cli::Cli, log, utils::path::normalize_path};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Config file looked up in the current directory when `--config` is absent.
pub const DEFAULT_CONFIG: &str = "assetflow.toml";

const DEFAULT_DEBOUNCE_MS: u64 = 300;

// ============================================================================
// file configuration
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    build: BuildSection,
    watch: WatchSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct BuildSection {
    src: PathBuf,
    dist: PathBuf,
    bundle: bool,
    clean: bool,
    external: Vec<String>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            src: "src".into(),
            dist: "dist".into(),
            bundle: false,
            clean: false,
            external: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct WatchSection {
    debounce_ms: u64,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl FileConfig {
    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            log!("config"; "ignoring unknown fields in {}: {}", path.display(), ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }
}

// ============================================================================
// build options
// ============================================================================

/// Immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Source root (absolute once resolved)
    pub src: PathBuf,
    /// Output root (absolute once resolved)
    pub dist: PathBuf,
    /// Inline script imports instead of leaving them unresolved
    pub bundle: bool,
    /// Module names excluded from bundling, in declaration order
    pub external: Vec<String>,
    /// Remove the output root before the first build
    pub clean: bool,
    /// Keep watching the source root after the first build
    pub watch: bool,
    /// Emit `debug!` messages
    pub verbose: bool,
    /// Quiet period a path must stay unchanged before it is reported
    pub debounce: Duration,
}

impl BuildOptions {
    /// Options with default flags for the given roots.
    pub fn new(src: impl Into<PathBuf>, dist: impl Into<PathBuf>) -> Self {
        Self {
            src: src.into(),
            dist: dist.into(),
            bundle: false,
            external: Vec::new(),
            clean: false,
            watch: false,
            verbose: false,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }

    pub fn with_bundle(mut self, bundle: bool) -> Self {
        self.bundle = bundle;
        self
    }

    pub fn with_external<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for module in modules {
            push_unique(&mut self.external, module.into());
        }
        self
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Resolve options from the config file (if any) and CLI flags.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let options = match config_path(cli) {
            Some(path) => {
                let file = FileConfig::from_path(&path)?;
                let base = path.parent().unwrap_or(Path::new(""));
                Self::from_file(file, base)
            }
            None => Self::from_file(FileConfig::default(), Path::new("")),
        };

        options.apply_cli(cli).resolve()
    }

    /// Paths in the config file are relative to the file's directory.
    fn from_file(file: FileConfig, base: &Path) -> Self {
        let mut options = Self::new(base.join(&file.build.src), base.join(&file.build.dist))
            .with_bundle(file.build.bundle)
            .with_clean(file.build.clean)
            .with_external(file.build.external);
        options.debounce = Duration::from_millis(file.watch.debounce_ms);
        options
    }

    /// Overlay CLI flags. Paths given on the command line are cwd-relative.
    fn apply_cli(mut self, cli: &Cli) -> Self {
        update_option(&mut self.src, cli.src.as_ref());
        update_option(&mut self.dist, cli.dist.as_ref());
        update_option(&mut self.bundle, cli.bundle.as_ref());
        update_option(&mut self.clean, cli.clean.as_ref());
        self.watch = cli.watch;
        self.verbose = cli.verbose;
        self.with_external(cli.external.iter().cloned())
    }

    /// Check the source root and normalize both roots to absolute paths.
    ///
    /// This is the startup precondition: nothing is traversed, cleaned or
    /// watched unless the source root is a readable directory.
    pub fn resolve(mut self) -> Result<Self, ConfigError> {
        let meta = fs::metadata(&self.src)
            .map_err(|err| ConfigError::MissingSource(self.src.clone(), err))?;
        if !meta.is_dir() {
            return Err(ConfigError::NotADirectory(self.src));
        }

        self.src = normalize_path(&self.src);
        self.dist = normalize_path(&self.dist);
        Ok(self)
    }

    /// Whether a module specifier is excluded from bundling.
    ///
    /// Matches the module name itself and any subpath (`lodash/chunk`).
    pub fn is_external(&self, specifier: &str) -> bool {
        self.external.iter().any(|name| {
            specifier == name
                || specifier
                    .strip_prefix(name.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Whether the output root lives inside the source root.
    pub fn dist_in_src(&self) -> bool {
        self.dist != self.src && self.dist.starts_with(&self.src)
    }
}

/// Explicit `--config` must exist; the default file is optional.
fn config_path(cli: &Cli) -> Option<PathBuf> {
    match &cli.config {
        Some(path) => Some(path.clone()),
        None => {
            let default = Path::new(DEFAULT_CONFIG);
            default.is_file().then(|| default.to_path_buf())
        }
    }
}

/// Update config option if CLI value is provided.
fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
    if let Some(option) = cli_option {
        *config_option = option.clone();
    }
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !item.is_empty() && !list.contains(&item) {
        list.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_defaults() {
        let (config, ignored) = FileConfig::parse_with_ignored("").unwrap();
        assert!(ignored.is_empty());
        assert_eq!(config.build.src, PathBuf::from("src"));
        assert_eq!(config.build.dist, PathBuf::from("dist"));
        assert!(!config.build.bundle);
        assert_eq!(config.watch.debounce_ms, DEFAULT_DEBOUNCE_MS);
    }

    #[test]
    fn test_file_sections() {
        let content = r#"
            [build]
            src = "web"
            bundle = true
            external = ["lodash", "react"]

            [watch]
            debounce_ms = 50
        "#;
        let (config, _) = FileConfig::parse_with_ignored(content).unwrap();
        assert_eq!(config.build.src, PathBuf::from("web"));
        assert!(config.build.bundle);
        assert_eq!(config.build.external, vec!["lodash", "react"]);
        assert_eq!(config.watch.debounce_ms, 50);
    }

    #[test]
    fn test_unknown_fields_collected() {
        let content = "[build]\nminify = true\n";
        let (_, ignored) = FileConfig::parse_with_ignored(content).unwrap();
        assert_eq!(ignored, vec!["build.minify"]);
    }

    #[test]
    fn test_invalid_toml() {
        let err = FileConfig::parse_with_ignored("[build\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_cli_overrides_file() {
        let (config, _) =
            FileConfig::parse_with_ignored("[build]\nsrc = \"web\"\nexternal = [\"a\"]\n").unwrap();
        let cli = Cli {
            dist: Some("out".into()),
            bundle: Some(true),
            external: vec!["b".into(), "a".into()],
            verbose: true,
            ..Cli::default()
        };

        let options = BuildOptions::from_file(config, Path::new("/site")).apply_cli(&cli);
        assert_eq!(options.src, PathBuf::from("/site/web"));
        assert_eq!(options.dist, PathBuf::from("out"));
        assert!(options.bundle);
        assert!(options.verbose);
        assert_eq!(options.external, vec!["a", "b"]);
    }

    #[test]
    fn test_resolve_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = BuildOptions::new(dir.path().join("nope"), dir.path().join("dist"))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSource(..)));
    }

    #[test]
    fn test_resolve_source_is_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let err = BuildOptions::new(&file, dir.path().join("dist"))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotADirectory(_)));
    }

    #[test]
    fn test_resolve_makes_roots_absolute() {
        let dir = TempDir::new().unwrap();
        let options = BuildOptions::new(dir.path(), dir.path().join("dist"))
            .resolve()
            .unwrap();
        assert!(options.src.is_absolute());
        assert!(options.dist.is_absolute());
        assert!(options.dist_in_src());
    }

    #[test]
    fn test_resolve_folds_parent_dirs_in_dist() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        let options = BuildOptions::new(dir.path().join("src"), dir.path().join("src/x/../dist"))
            .resolve()
            .unwrap();
        assert_eq!(options.dist, options.src.join("dist"));
        assert!(options.dist_in_src());
    }

    #[test]
    fn test_is_external() {
        let options = BuildOptions::new("src", "dist").with_external(["lodash", "@scope/pkg"]);
        assert!(options.is_external("lodash"));
        assert!(options.is_external("lodash/chunk"));
        assert!(options.is_external("@scope/pkg/sub"));
        assert!(!options.is_external("lodash-es"));
        assert!(!options.is_external("react"));
    }
}
