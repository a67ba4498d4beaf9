//! Minification for scripts, stylesheets and markup.
//!
//! Uses oxc for JavaScript, lightningcss for CSS and minify-html for HTML.
//! Each function returns the minified text or the minifier's diagnostics;
//! none of them touch the filesystem.

use std::path::Path;
use std::sync::{Arc, RwLock};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

/// Source type inferred from the extension, ES module when unknown.
pub fn script_source_type(path: &Path) -> SourceType {
    SourceType::from_path(path).unwrap_or_else(|_| SourceType::mjs())
}

/// Minify JavaScript source code.
///
/// Parse errors are returned as diagnostics; nothing is emitted for a
/// source that does not parse.
pub fn minify_script(source: &str, source_type: SourceType) -> Result<String, Vec<String>> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return Err(ret.errors.iter().map(ToString::to_string).collect());
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify CSS source code with default options.
///
/// The parser runs in recovery mode so every invalid rule is reported, not
/// just the first one. Any recovered error fails the whole stylesheet.
pub fn minify_style(source: &str, filename: &Path) -> Result<String, Vec<String>> {
    let warnings = Arc::new(RwLock::new(Vec::new()));
    let options = ParserOptions {
        filename: filename.display().to_string(),
        error_recovery: true,
        warnings: Some(Arc::clone(&warnings)),
        ..ParserOptions::default()
    };

    let mut stylesheet = StyleSheet::parse(source, options).map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = warnings
        .read()
        .map(|list| list.iter().map(ToString::to_string).collect())
        .unwrap_or_default();
    if !errors.is_empty() {
        return Err(errors);
    }

    stylesheet
        .minify(MinifyOptions::default())
        .map_err(|e| vec![e.to_string()])?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| vec![e.to_string()])?;
    Ok(result.code)
}

/// Fixed markup options: collapse whitespace, drop comments, redundant and
/// default attributes, short doctype, minify inline CSS and JS.
fn markup_config() -> minify_html::Cfg {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    cfg
}

/// Minify HTML source code.
///
/// minify-html has no error channel; a panic inside it or non-UTF-8 output
/// is reported as a failure instead of taking the process down.
pub fn minify_markup(source: &str) -> Result<String, String> {
    let cfg = markup_config();
    let minified = std::panic::catch_unwind(|| minify_html::minify(source.as_bytes(), &cfg))
        .map_err(|_| "markup minifier panicked".to_string())?;
    String::from_utf8(minified).map_err(|e| format!("markup minifier produced invalid UTF-8: {e}"))
}
