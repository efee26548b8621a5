//! Logging setup shared by the cookbookfs crates.
//!
//! Usage:
//! - Set COOKBOOKFS_LOG=off (default) - no logs
//! - Set COOKBOOKFS_LOG=info - listing and upload outcomes
//! - Set COOKBOOKFS_LOG=debug - cache, scratch workspace and alias details

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable selecting the minimum log level.
pub const LOG_ENV: &str = "COOKBOOKFS_LOG";

static INIT: Once = Once::new();

/// Level requested by a `COOKBOOKFS_LOG` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSetting {
    Off,
    Min(emit::Level),
    /// Unrecognized value, treated as info.
    Unknown,
}

impl LogSetting {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "off" => LogSetting::Off,
            "debug" => LogSetting::Min(emit::Level::Debug),
            "info" => LogSetting::Min(emit::Level::Info),
            "warn" => LogSetting::Min(emit::Level::Warn),
            "error" => LogSetting::Min(emit::Level::Error),
            _ => LogSetting::Unknown,
        }
    }
}

/// Initialize diagnostics from the `COOKBOOKFS_LOG` environment variable.
///
/// Safe to call more than once; only the first call has any effect.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let raw = std::env::var(LOG_ENV).unwrap_or_default();
        let level = match LogSetting::parse(&raw) {
            LogSetting::Off => return,
            LogSetting::Min(level) => level,
            LogSetting::Unknown => {
                eprintln!("Warning: Unknown {LOG_ENV} value '{raw}', using 'info'");
                emit::Level::Info
            }
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        // The runtime lives for the rest of the process.
        std::mem::forget(rt);
    });
}

/// Log detailed diagnostics (cache state, scratch paths, request paths).
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log operations a user may want to see (listings, uploads).
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log recoverable problems (skipped ignore patterns, cleanup failures).
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures that abort an operation.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

pub use init_diagnostics as init;
