//! Benchmark History
//!
//! Bounded, per-category benchmark metric history for trend dashboards.
//!
//! # Features
//!
//! - Time-aware downsampling that keeps both boundary points and never
//!   drops entries with unparseable timestamps
//! - Idempotent merging keyed by snapshot timestamp, with derived
//!   percent-change and previous-value fields
//! - Extractors for Criterion, Gungraun/Callgrind and quality reports
//! - Atomic JSON document persistence
//! - Backfill from archived timestamped snapshots
//!
//! # Quick Start
//!
//! ```bash
//! bench-history parse --criterion-dir target/criterion \
//!     --gungraun-output gungraun.txt --quality-results quality.txt
//! ```
//!
//! # Architecture
//!
//! ```text
//! tool output ──▶ extract ──▶ MetricsSnapshot ──┐
//!                                               ▼
//! HistoryStore::load ──▶ History ──▶ merge ──▶ downsample
//!                                               │
//! HistoryStore::save ◀── HistoryDocument ◀──────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod backfill;
pub mod config;
pub mod error;
pub mod extract;
pub mod history;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod traits;

#[cfg(test)]
mod test_utils;
