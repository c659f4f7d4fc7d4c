//! Configuration management.
//!
//! This module handles:
//! - Environment variable loading
//! - Configuration validation
//! - Default value handling
//! - The benchmark [`Category`] table
//!
//! # Example
//!
//! ```
//! use bench_history::config::{Config, DEFAULT_MAX_HISTORY};
//! use std::path::PathBuf;
//!
//! // Create a config directly (use Config::from_env() in production)
//! let config = Config {
//!     history_dir: PathBuf::from(".benchmark-history"),
//!     output_dir: PathBuf::from("gh-pages/data"),
//!     max_history: DEFAULT_MAX_HISTORY,
//!     backfill_max_history: 500,
//!     strict: true,
//!     log_level: "info".to_string(),
//! };
//!
//! assert!(bench_history::config::validate_config(&config).is_ok());
//! ```

mod categories;
mod validation;

pub use categories::{
    default_categories, find_category, Category, CRITERION, GUNGRAUN, QUALITY,
};
pub use validation::{validate_config, MAX_HISTORY_CEILING, MIN_HISTORY};

use crate::error::ConfigError;
use std::path::PathBuf;
use tracing_subscriber::filter::EnvFilter;

/// Default directory for persisted history documents.
pub const DEFAULT_HISTORY_DIR: &str = ".benchmark-history";

/// Default directory for dashboard `*-latest.json` documents.
pub const DEFAULT_OUTPUT_DIR: &str = "gh-pages/data";

/// Default history cap applied on every merge.
pub const DEFAULT_MAX_HISTORY: usize = 30;

/// Default history cap applied when backfilling from archived snapshots.
pub const DEFAULT_BACKFILL_MAX_HISTORY: usize = 500;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Application configuration.
///
/// Use [`Config::from_env`] to load configuration from environment variables.
/// Command-line flags override individual fields afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `*-history.json` documents.
    pub history_dir: PathBuf,
    /// Directory receiving `*-latest.json` documents.
    pub output_dir: PathBuf,
    /// History cap for merges.
    pub max_history: usize,
    /// History cap for backfills.
    pub backfill_max_history: usize,
    /// Strict extraction and document loading.
    pub strict: bool,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_dir: PathBuf::from(DEFAULT_HISTORY_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_history: DEFAULT_MAX_HISTORY,
            backfill_max_history: DEFAULT_BACKFILL_MAX_HISTORY,
            strict: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables (with defaults):
    /// - `BENCH_HISTORY_DIR`: history documents (default: `.benchmark-history`)
    /// - `BENCH_OUTPUT_DIR`: latest documents (default: `gh-pages/data`)
    /// - `BENCH_MAX_HISTORY`: merge cap (default: `30`)
    /// - `BENCH_BACKFILL_MAX_HISTORY`: backfill cap (default: `500`)
    /// - `BENCH_STRICT`: strict mode (default: `true`)
    /// - `LOG_LEVEL`: logging level (default: `info`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value does not parse or fails
    /// validation (see [`validate_config`]).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let history_dir = std::env::var("BENCH_HISTORY_DIR")
            .map_or_else(|_| PathBuf::from(DEFAULT_HISTORY_DIR), PathBuf::from);
        let output_dir = std::env::var("BENCH_OUTPUT_DIR")
            .map_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR), PathBuf::from);
        let max_history = parse_env_usize("BENCH_MAX_HISTORY", DEFAULT_MAX_HISTORY)?;
        let backfill_max_history =
            parse_env_usize("BENCH_BACKFILL_MAX_HISTORY", DEFAULT_BACKFILL_MAX_HISTORY)?;
        let strict = parse_env_bool("BENCH_STRICT", true)?;
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.into());

        let config = Self {
            history_dir,
            output_dir,
            max_history,
            backfill_max_history,
            strict,
            log_level,
        };

        validate_config(&config)?;
        Ok(config)
    }

    /// Tracing filter for [`Config::log_level`]. Falls back to
    /// [`DEFAULT_LOG_LEVEL`] when the level does not parse.
    #[must_use]
    pub fn log_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
    }
}

/// Parse an environment variable as usize, using a default if not set.
fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        val.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}

/// Parse an environment variable as a boolean flag, using a default if not set.
fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    std::env::var(name).map_or(Ok(default), |val| {
        match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                var: name.into(),
                reason: "must be true or false".into(),
            }),
        }
    })
}
