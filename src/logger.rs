//! Logging utilities with colored module prefixes.
//!
//! Provides the `log!` macro used across the crate:
//!
//! ```ignore
//! log!("compose"; "building `{}` ({} templates)", name, count);
//! ```
//!
//! Output is disabled by default so embedding hosts stay quiet; call
//! [`set_verbose`] during bootstrap to enable it.

use colored::{ColoredString, Colorize};
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
};

/// Whether log output is written at all (off by default for library use)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enable or disable log output for this process.
pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

/// Whether log output is currently enabled.
pub fn verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Log a message with a colored module prefix.
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

/// Log a message with a colored module prefix. Prefer the `log!` macro.
pub fn log(module: &str, message: &str) {
    if !verbose() {
        return;
    }
    let prefix = colorize_prefix(module, &module.to_ascii_lowercase());
    let mut stdout = stdout().lock();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "registry" => prefix.bright_blue().bold(),
        "compose" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}
