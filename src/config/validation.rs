//! Configuration validation.
//!
//! This module provides validation logic for configuration values,
//! ensuring they are within acceptable ranges.

use super::Config;
use crate::error::ConfigError;

/// Smallest usable history cap: compaction always keeps both boundaries.
pub const MIN_HISTORY: usize = 2;

/// Largest allowed history cap.
pub const MAX_HISTORY_CEILING: usize = 100_000;

/// Validate configuration values.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if any value is out of range:
/// - `BENCH_MAX_HISTORY` must be between 2 and 100000
/// - `BENCH_BACKFILL_MAX_HISTORY` must be between 2 and 100000
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    check_cap("BENCH_MAX_HISTORY", config.max_history)?;
    check_cap("BENCH_BACKFILL_MAX_HISTORY", config.backfill_max_history)?;
    Ok(())
}

fn check_cap(var: &str, value: usize) -> Result<(), ConfigError> {
    if (MIN_HISTORY..=MAX_HISTORY_CEILING).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            var: var.into(),
            reason: format!("must be between {MIN_HISTORY} and {MAX_HISTORY_CEILING}"),
        })
    }
}
