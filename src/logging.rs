//! Logging infrastructure built on `tracing`.
//!
//! A cdylib loaded into a game has no `main` to own the appender guard, so
//! the guard lives in a process-global and flushes on library unload.
//! `RUST_LOG` overrides the configured level when set.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact single-line format
    #[default]
    Compact,
    /// Human-readable format with timestamps
    Pretty,
    /// JSON format for structured logging
    Json,
}

/// Logging configuration, usually deserialized from the `[log]` table of
/// `pygml.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Filter directive, e.g. "info" or "pygml=debug"
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Directory for daily-rolling log files; stderr when unset
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            directory: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

static GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Initialize the global logging system. Safe to call more than once; only
/// the first initialization wins.
pub fn init_logging(settings: &LogSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let (writer, guard) = match &settings.directory {
        Some(dir) => tracing_appender::non_blocking(rolling::daily(dir, "pygml")),
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let result = match settings.format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(writer).compact().with_filter(filter))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(writer).pretty().with_filter(filter))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(writer).json().with_filter(filter))
            .try_init(),
    };

    if result.is_ok() {
        let _ = GUARD.set(guard);
    }
}
