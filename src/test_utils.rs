//! Test utilities and fixtures.
//!
//! This module provides shared testing infrastructure:
//! - History and snapshot factories keyed by second offsets
//! - Mock factories for traits
//! - Sample tool output
//!
//! Only compiled for tests (`#[cfg(test)]`).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::history::{epoch_seconds, History, HistoryEntry, MetricsSnapshot};
use crate::store::HistoryDocument;
use crate::traits::MockTimeProvider;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map};
use std::collections::BTreeMap;
use std::path::Path;

/// 2025-01-01T00:00:00Z.
pub const BASE_EPOCH: i64 = 1_735_689_600;

/// RFC 3339 timestamp `offset` seconds after [`BASE_EPOCH`].
#[must_use]
pub fn timestamp_at_offset(offset: i64) -> String {
    DateTime::from_timestamp(BASE_EPOCH + offset, 0)
        .unwrap()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Empty snapshot `offset` seconds after [`BASE_EPOCH`].
#[must_use]
pub fn snapshot_at_offset(offset: i64) -> MetricsSnapshot {
    MetricsSnapshot::new(timestamp_at_offset(offset), BTreeMap::new())
}

/// History entry with a raw timestamp and no metrics.
#[must_use]
pub fn entry_at(timestamp: &str) -> HistoryEntry {
    HistoryEntry {
        timestamp: timestamp.to_string(),
        fields: Map::new(),
    }
}

/// History with one entry per offset; entry `i` stores `v = i`.
#[must_use]
pub fn history_from_offsets(offsets: &[i64]) -> History {
    offsets
        .iter()
        .enumerate()
        .map(|(i, offset)| {
            let mut entry = entry_at(&timestamp_at_offset(*offset));
            entry.fields.insert("v".into(), json!(i));
            entry
        })
        .collect()
}

/// Second offsets of every entry, inverse of [`history_from_offsets`].
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn offsets_of(history: &History) -> Vec<i64> {
    history
        .iter()
        .map(|entry| epoch_seconds(&entry.timestamp).unwrap() as i64 - BASE_EPOCH)
        .collect()
}

/// Create a mock time provider that always returns `at`.
#[must_use]
pub fn mock_time(at: DateTime<Utc>) -> MockTimeProvider {
    let mut mock = MockTimeProvider::new();
    mock.expect_now().returning(move || at);
    mock
}

/// Clock fixed at [`BASE_EPOCH`].
#[must_use]
pub fn fixed_clock() -> MockTimeProvider {
    mock_time(DateTime::from_timestamp(BASE_EPOCH, 0).unwrap())
}

/// A two-entry document of the given category.
#[must_use]
pub fn sample_document(kind: &str) -> HistoryDocument {
    serde_json::from_value(json!({
        "timestamp": timestamp_at_offset(60),
        "type": kind,
        "metrics": {"avg_time_ms": 1.5, "total_benchmarks": 2},
        "history": [
            {"timestamp": timestamp_at_offset(0), "avg_time_ms": 1.25, "total_benchmarks": 2},
            {"timestamp": timestamp_at_offset(60), "avg_time_ms": 1.5, "total_benchmarks": 2}
        ]
    }))
    .unwrap()
}

/// Write `<dir>/<name>/base/estimates.json`.
pub fn write_criterion_group(dir: &Path, name: &str, mean_ns: f64, std_dev: f64) {
    let base = dir.join(name).join("base");
    std::fs::create_dir_all(&base).unwrap();
    let estimates = json!({
        "mean": {"point_estimate": mean_ns},
        "std_dev": {"point_estimate": std_dev}
    });
    std::fs::write(base.join("estimates.json"), estimates.to_string()).unwrap();
}

/// Write an archived snapshot document with a single metric `x`.
pub fn write_snapshot_file(dir: &Path, name: &str, offset: i64, x: i64) {
    let doc = json!({
        "timestamp": timestamp_at_offset(offset),
        "type": "quality",
        "metrics": {"x": x}
    });
    std::fs::write(dir.join(name), doc.to_string()).unwrap();
}

/// Valgrind end-of-run summary.
pub const CALLGRIND_SUMMARY: &str = "\
==12345== I   refs:      1,250,000
==12345== I1  misses:        1,200
==12345== LLi misses:          900
==12345== D   refs:        400,000  (300,000 rd   + 100,000 wr)
==12345== D1  misses:       15,200  ( 10,000 rd   +   5,200 wr)
==12345== total heap usage: 5,000 allocs, 4,990 frees, 47,448,064 bytes allocated
";

/// Gungraun terminal output with two benchmarks.
pub const GUNGRAUN_TERMINAL: &str = "\
gungraun_routing::bench_route::simple
  Instructions:                       38,331|N/A             (*********)
  L1 Hits:                            53,765|N/A             (*********)
  L2 Hits:                                 6|N/A             (*********)
  RAM Hits:                               45|N/A             (*********)
  Estimated Cycles:                   55,370|N/A             (*********)
gungraun_executor::bench_exec
  Instructions:                        1,200|N/A             (*********)
  L1 Hits:                             1,500|N/A             (*********)
  LL Hits:                                12|N/A             (*********)
  RAM Hits:                                3|N/A             (*********)
  Estimated Cycles:                    2,000|N/A             (*********)
";

/// Quality benchmark text report.
pub const QUALITY_REPORT: &str = "\
Quality Benchmark Results
=========================
Total Tests: 150
Passed: 143
Failed: 7
Success Rate: 95.5%
Average Score: 8.7
";
