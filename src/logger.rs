//! Console logging with colored module prefixes.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro gated on an explicit verbose flag
//! - `WatchStatus` for watch mode status messages
//!
//! # Example
//!
//! ```ignore
//! log!("build"; "processed {} files", count);
//! debug!(options.verbose, "watch"; "event: {}", path.display());
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use std::io::{Write, stdout};

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message only when `$verbose` is true.
///
/// The flag comes from `BuildOptions::verbose`; there is no global switch.
///
/// # Usage
/// ```ignore
/// debug!(options.verbose, "module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($verbose:expr, $module:expr; $($arg:tt)*) => {{
        if $verbose {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "watch" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        "clean" => prefix.bright_blue().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Watch Status
// ============================================================================

/// Wall-clock time of day (UTC) as HH:MM:SS.
fn now() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Timestamped status lines for watch mode.
///
/// Every reconciled event produces one entry: `✓` for a rebuilt or removed
/// output, `✗` plus the error detail for a failure. Lines are appended, so
/// an error stays visible after later successes.
///
/// # Example
///
/// ```ignore
/// let mut status = WatchStatus::new();
/// status.success("rebuilt: css/site.css");
/// status.error("failed: js/app.js", "could not resolve \"lodash\"");
/// ```
#[derive(Debug, Default)]
pub struct WatchStatus;

impl WatchStatus {
    pub const fn new() -> Self {
        Self
    }

    /// Display success message (✓ prefix, green).
    pub fn success(&mut self, message: &str) {
        self.display(format!("{}", "✓".green()), message);
    }

    /// Display error message (✗ prefix, red) with optional detail.
    pub fn error(&mut self, summary: &str, detail: &str) {
        self.display(format!("{}", "✗".red()), &format_error(summary, detail));
    }

    fn display(&mut self, symbol: String, message: &str) {
        let timestamp = format!("[{}]", now()).dimmed().to_string();

        let mut stdout = stdout().lock();
        writeln!(stdout, "{timestamp} {symbol} {message}").ok();
        stdout.flush().ok();
    }
}

/// Join an error summary and its (possibly multi-line) detail.
fn format_error(summary: &str, detail: &str) -> String {
    if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    }
}

// ============================================================================
// Tests
// ============================================================================
