//! Module specifier resolution for the browser platform.
//!
//! ```text
//! "lodash"        external?  → External("lodash")
//! "./util"        relative   → util, util.js, util.mjs, util.cjs, util/index.js
//! "preact/hooks"  bare       → node_modules/preact/hooks(.js) in any ancestor
//! "preact"        bare       → node_modules/preact + package.json main field
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::BuildOptions;
use crate::error::ProcessError;
use crate::utils::path::normalize_path;

/// Suffixes tried for extensionless specifiers, in order.
const EXTENSIONS: [&str; 3] = ["js", "mjs", "cjs"];

/// package.json fields consulted for a package entry, browser first.
const MAIN_FIELDS: [&str; 3] = ["browser", "module", "main"];

/// Outcome of resolving one import specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A file to inline (absolute, normalized).
    Local(PathBuf),
    /// Left as an import in the output.
    External(String),
}

/// Resolve `specifier` as imported by `importer`.
///
/// Declared externals and URL imports are never looked up on disk.
pub fn resolve(
    specifier: &str,
    importer: &Path,
    options: &BuildOptions,
) -> Result<Resolved, ProcessError> {
    if options.is_external(specifier) || is_url(specifier) {
        return Ok(Resolved::External(specifier.to_string()));
    }

    let dir = importer.parent().unwrap_or(Path::new(""));
    let found = if is_relative(specifier) {
        resolve_file(&dir.join(specifier))
    } else {
        resolve_package(specifier, dir)
    };

    found
        .map(|path| Resolved::Local(normalize_path(&path)))
        .ok_or_else(|| ProcessError::UnresolvedModule {
            specifier: specifier.to_string(),
            importer: importer.to_path_buf(),
        })
}

fn is_relative(specifier: &str) -> bool {
    matches!(specifier, "." | "..")
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
}

fn is_url(specifier: &str) -> bool {
    specifier.starts_with("http://")
        || specifier.starts_with("https://")
        || specifier.starts_with("data:")
}

/// Exact file, then known suffixes, then a directory entry.
fn resolve_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    if let Some(found) = with_extensions(path) {
        return Some(found);
    }
    if path.is_dir() {
        return resolve_directory(path);
    }
    None
}

fn with_extensions(path: &Path) -> Option<PathBuf> {
    EXTENSIONS.iter().find_map(|ext| {
        let mut candidate = path.as_os_str().to_owned();
        candidate.push(".");
        candidate.push(ext);
        let candidate = PathBuf::from(candidate);
        candidate.is_file().then_some(candidate)
    })
}

/// package.json main field, falling back to `index`.
fn resolve_directory(dir: &Path) -> Option<PathBuf> {
    main_field(dir)
        .and_then(|entry| {
            let target = dir.join(entry);
            if target.is_file() {
                Some(target)
            } else {
                with_extensions(&target).or_else(|| with_extensions(&target.join("index")))
            }
        })
        .or_else(|| with_extensions(&dir.join("index")))
}

fn main_field(dir: &Path) -> Option<String> {
    let content = fs::read_to_string(dir.join("package.json")).ok()?;
    let manifest: serde_json::Value = serde_json::from_str(&content).ok()?;
    MAIN_FIELDS
        .iter()
        .find_map(|field| manifest.get(field).and_then(|v| v.as_str()))
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
}

/// Look up a bare specifier in `node_modules` of `dir` and its ancestors.
fn resolve_package(specifier: &str, dir: &Path) -> Option<PathBuf> {
    let (name, subpath) = split_package(specifier)?;

    dir.ancestors().find_map(|ancestor| {
        let package = ancestor.join("node_modules").join(name);
        if !package.is_dir() {
            return None;
        }
        match subpath {
            Some(sub) => resolve_file(&package.join(sub)),
            None => resolve_directory(&package),
        }
    })
}

/// `"@scope/pkg/sub"` → `("@scope/pkg", Some("sub"))`, `"pkg"` → `("pkg", None)`.
fn split_package(specifier: &str) -> Option<(&str, Option<&str>)> {
    let name_end = if specifier.starts_with('@') {
        let slash = specifier.find('/')?;
        specifier[slash + 1..]
            .find('/')
            .map_or(specifier.len(), |i| slash + 1 + i)
    } else {
        specifier.find('/').unwrap_or(specifier.len())
    };

    let name = &specifier[..name_end];
    if name.is_empty() {
        return None;
    }
    let subpath = specifier
        .get(name_end + 1..)
        .filter(|rest| !rest.is_empty());
    Some((name, subpath))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn local(resolved: Resolved) -> PathBuf {
        match resolved {
            Resolved::Local(path) => path,
            Resolved::External(name) => panic!("unexpected external {name}"),
        }
    }

    #[test]
    fn test_split_package() {
        assert_eq!(split_package("lodash"), Some(("lodash", None)));
        assert_eq!(split_package("lodash/chunk"), Some(("lodash", Some("chunk"))));
        assert_eq!(split_package("@scope/pkg"), Some(("@scope/pkg", None)));
        assert_eq!(split_package("@scope/pkg/a/b"), Some(("@scope/pkg", Some("a/b"))));
        assert_eq!(split_package("@scope"), None);
    }

    #[test]
    fn test_relative_with_extension_fallback() {
        let dir = TempDir::new().unwrap();
        let importer = dir.path().join("app.js");
        write(&dir.path().join("lib/util.mjs"), "export const a = 1;");

        let options = BuildOptions::new(dir.path(), dir.path().join("dist"));
        let path = local(resolve("./lib/util", &importer, &options).unwrap());
        assert!(path.ends_with("lib/util.mjs"));
    }

    #[test]
    fn test_relative_directory_index() {
        let dir = TempDir::new().unwrap();
        let importer = dir.path().join("app.js");
        write(&dir.path().join("widgets/index.js"), "export default 1;");

        let options = BuildOptions::new(dir.path(), dir.path().join("dist"));
        let path = local(resolve("./widgets", &importer, &options).unwrap());
        assert!(path.ends_with("widgets/index.js"));
    }

    #[test]
    fn test_missing_relative_is_unresolved() {
        let dir = TempDir::new().unwrap();
        let options = BuildOptions::new(dir.path(), dir.path().join("dist"));
        let err = resolve("./nope", &dir.path().join("app.js"), &options).unwrap_err();
        assert!(matches!(err, ProcessError::UnresolvedModule { ref specifier, .. } if specifier == "./nope"));
    }

    #[test]
    fn test_bare_prefers_browser_field() {
        let dir = TempDir::new().unwrap();
        let package = dir.path().join("node_modules/tiny");
        write(
            &package.join("package.json"),
            r#"{ "main": "node.js", "module": "esm.js", "browser": "browser.js" }"#,
        );
        write(&package.join("browser.js"), "export default 1;");
        write(&package.join("esm.js"), "export default 2;");

        let importer = dir.path().join("src/a/app.js");
        let options = BuildOptions::new(dir.path().join("src"), dir.path().join("dist"));
        let path = local(resolve("tiny", &importer, &options).unwrap());
        assert!(path.ends_with("node_modules/tiny/browser.js"));
    }

    #[test]
    fn test_bare_subpath() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("node_modules/tiny/extra.js"), "export const x = 1;");

        let options = BuildOptions::new(dir.path(), dir.path().join("dist"));
        let path = local(resolve("tiny/extra", &dir.path().join("app.js"), &options).unwrap());
        assert!(path.ends_with("node_modules/tiny/extra.js"));
    }

    #[test]
    fn test_bare_missing_is_unresolved() {
        let dir = TempDir::new().unwrap();
        let options = BuildOptions::new(dir.path(), dir.path().join("dist"));
        let err = resolve("lodash", &dir.path().join("app.js"), &options).unwrap_err();
        assert!(matches!(err, ProcessError::UnresolvedModule { .. }));
    }

    #[test]
    fn test_external_and_url() {
        let dir = TempDir::new().unwrap();
        let options =
            BuildOptions::new(dir.path(), dir.path().join("dist")).with_external(["lodash"]);
        let importer = dir.path().join("app.js");

        assert_eq!(
            resolve("lodash/chunk", &importer, &options).unwrap(),
            Resolved::External("lodash/chunk".into())
        );
        assert_eq!(
            resolve("https://esm.sh/preact", &importer, &options).unwrap(),
            Resolved::External("https://esm.sh/preact".into())
        );
    }
}
