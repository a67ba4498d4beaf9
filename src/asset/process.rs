//! Asset processing with side effects (copying, minification, bundling).
//!
//! This is the only place that writes into the output tree. Every strategy
//! computes its full output before writing, so a failed transform leaves no
//! file behind.

use std::fs;
use std::path::{Path, PathBuf};

use oxc::span::SourceType;

use crate::bundle;
use crate::config::BuildOptions;
use crate::error::{IoContext, ProcessError};

use super::minify::{minify_markup, minify_script, minify_style, script_source_type};
use super::{AssetRoute, Strategy};

/// Process one source file into its mirrored output path.
///
/// Returns the route that was written.
pub fn process_file(source: &Path, options: &BuildOptions) -> Result<AssetRoute, ProcessError> {
    let route = AssetRoute::new(source, &options.src, &options.dist)?;

    match route.strategy {
        Strategy::ImagePassthrough | Strategy::GenericPassthrough => {
            ensure_parent(&route.output)?;
            fs::copy(&route.source, &route.output).at(&route.source)?;
        }
        Strategy::Script => {
            let code = transform_script(&route.source, options)?;
            write(&route.output, code)?;
        }
        Strategy::Stylesheet => {
            let source = fs::read_to_string(&route.source).at(&route.source)?;
            let code = minify_style(&source, &route.source)
                .map_err(|errors| ProcessError::transform(&route.source, errors))?;
            write(&route.output, code)?;
        }
        Strategy::Markup => {
            let source = fs::read_to_string(&route.source).at(&route.source)?;
            let code = minify_markup(&source)
                .map_err(|error| ProcessError::transform(&route.source, [error]))?;
            write(&route.output, code)?;
        }
    }

    Ok(route)
}

/// Minify a script, bundling its imports first when enabled.
fn transform_script(path: &Path, options: &BuildOptions) -> Result<String, ProcessError> {
    let (code, source_type) = if options.bundle {
        (bundle::bundle(path, options)?, SourceType::mjs())
    } else {
        (fs::read_to_string(path).at(path)?, script_source_type(path))
    };
    minify_script(&code, source_type).map_err(|errors| ProcessError::transform(path, errors))
}

fn write(path: &Path, content: String) -> Result<(), ProcessError> {
    ensure_parent(path)?;
    fs::write(path, content).at(path)
}

fn ensure_parent(path: &Path) -> Result<(), ProcessError> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).at(parent),
        None => Ok(()),
    }
}

/// Remove the mirrored output of `source`, file or directory.
///
/// Returns the removed path, or `None` if nothing was there.
pub fn remove_output(source: &Path, options: &BuildOptions) -> Result<Option<PathBuf>, ProcessError> {
    let output = super::output_path(&options.src, &options.dist, source)?;

    let result = match fs::symlink_metadata(&output) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(&output),
        Ok(_) => fs::remove_file(&output),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(Some(output)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ProcessError::io(output, e)),
    }
}
