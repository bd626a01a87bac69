//! Logging backend for the wrangle CLI.
//!
//! The library crates log through the `log` facade. The subscriber installed
//! here forwards those records to `tracing` and writes them to stderr, so
//! stdout stays reserved for JSON output.
//!
//! `RUST_LOG` takes precedence over the verbosity flags when set.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Configuration for the global subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is not set.
    pub level: Level,
    /// Whether to include the module path of each record.
    pub with_target: bool,
    /// Whether to colour the output.
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_target: false,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    /// Map a `-v` count to a level.
    ///
    /// - 0: info
    /// - 1: debug
    /// - 2 or more: trace
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            ..Self::default()
        }
    }

    /// Enable or disable module paths in the output.
    #[must_use]
    pub const fn with_target(mut self, enable: bool) -> Self {
        self.with_target = enable;
        self
    }

    /// Enable or disable ANSI colours.
    #[must_use]
    pub const fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }
}

/// Build the filter applied to every record.
///
/// Falls back to `config.level` when `RUST_LOG` is unset or invalid.
#[must_use]
pub fn build_env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str().to_ascii_lowercase()))
}

/// Install the global subscriber.
///
/// # Errors
/// Returns [`crate::CliError::InitLogging`] when a global subscriber or
/// `log` bridge is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), crate::CliError> {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(config.with_target)
        .without_time();
    tracing_subscriber::registry()
        .with(build_env_filter(config))
        .with(layer)
        .try_init()
        .map_err(crate::CliError::InitLogging)
}
