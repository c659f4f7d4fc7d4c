//! Bounded benchmark history.
//!
//! This module provides the compaction and merge core:
//! - [`score`]: eviction priority of an interior point
//! - [`downsample`]: cap a history while keeping its boundaries and order
//! - [`merge`]: append a snapshot once per observation instant and derive
//!   period-over-period deltas
//!
//! Every function here is pure: values in, new values out.
//!
//! # Example
//!
//! ```
//! use bench_history::history::{merge, History, MetricsSnapshot};
//! use std::collections::BTreeMap;
//!
//! let snapshot = MetricsSnapshot::new("2025-01-01T00:00:00Z", BTreeMap::new())
//!     .with_metric("total_instructions", 1_250_000_i64);
//! let outcome = merge(History::new(), &snapshot, 30)?;
//! assert_eq!(outcome.history.len(), 1);
//! assert!(outcome.change("total_instructions").is_none());
//! # Ok::<(), bench_history::error::SnapshotError>(())
//! ```

mod downsample;
mod merge;
mod scorer;
mod types;

pub use downsample::downsample;
pub use merge::{merge, with_deltas, MergeOutcome};
pub use scorer::{score, AGE_WEIGHT, PROXIMITY_WEIGHT};
pub use types::{
    epoch_seconds, is_derived_metric, parse_timestamp, History, HistoryEntry, MetricValue,
    MetricsSnapshot, CHANGE_SUFFIX, PREV_PREFIX,
};
