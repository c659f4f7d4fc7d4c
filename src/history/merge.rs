//! Merging a fresh snapshot into persisted history.

use super::downsample::downsample;
use super::types::{
    is_derived_metric, History, HistoryEntry, MetricValue, MetricsSnapshot, CHANGE_SUFFIX,
    PREV_PREFIX,
};
use crate::error::SnapshotError;
use std::collections::BTreeMap;
use tracing::debug;

/// Result of [`merge`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Updated history, compacted to the cap when needed.
    pub history: History,
    /// Metrics of the current entry plus derived `<name>_change` and
    /// `prev_<name>` fields. Reporting only; never stored in history.
    pub current: BTreeMap<String, MetricValue>,
    /// False when the snapshot duplicated the last stored timestamp.
    pub appended: bool,
}

impl MergeOutcome {
    /// Percent change of a metric against the previous entry, if derived.
    #[must_use]
    pub fn change(&self, metric: &str) -> Option<f64> {
        self.current
            .get(&format!("{metric}{CHANGE_SUFFIX}"))
            .map(|value| value.as_f64())
    }

    /// Previous value of a metric, if derived.
    #[must_use]
    pub fn previous(&self, metric: &str) -> Option<MetricValue> {
        self.current.get(&format!("{PREV_PREFIX}{metric}")).copied()
    }
}

/// Append `snapshot` to `existing` and derive period-over-period deltas.
///
/// - A snapshot whose timestamp equals the last stored entry's is not
///   appended; the stored entry is treated as current instead. Timestamps
///   are compared as strings, so `...:00Z` and `...:00.000Z` count as
///   different observations; extractors always stamp with
///   [`MetricsSnapshot::at`], which emits one fixed format.
/// - Deltas compare the current entry with the entry right before it, and
///   are only derived where the previous value is strictly positive.
/// - Deltas are derived before compaction, then the history is downsampled
///   if it exceeds `max_entries`.
///
/// # Errors
///
/// Returns [`SnapshotError::InvalidTimestamp`] if the snapshot's timestamp
/// is not a well-formed instant.
///
/// # Example
///
/// ```
/// use bench_history::history::{merge, History, MetricsSnapshot};
/// use std::collections::BTreeMap;
///
/// let first = MetricsSnapshot::new("2025-01-01T00:00:00Z", BTreeMap::new())
///     .with_metric("x", 100_i64);
/// let second = MetricsSnapshot::new("2025-01-02T00:00:00Z", BTreeMap::new())
///     .with_metric("x", 120_i64);
///
/// let outcome = merge(History::new(), &first, 30)?;
/// let outcome = merge(outcome.history, &second, 30)?;
/// assert_eq!(outcome.history.len(), 2);
/// assert!((outcome.change("x").unwrap() - 20.0).abs() < 1e-9);
/// # Ok::<(), bench_history::error::SnapshotError>(())
/// ```
pub fn merge(
    existing: History,
    snapshot: &MetricsSnapshot,
    max_entries: usize,
) -> Result<MergeOutcome, SnapshotError> {
    if snapshot.epoch_seconds().is_none() {
        return Err(SnapshotError::InvalidTimestamp {
            timestamp: snapshot.timestamp.clone(),
        });
    }

    let mut history = existing;
    let appended = history
        .last()
        .map_or(true, |last| last.timestamp != snapshot.timestamp);
    if appended {
        history.push(HistoryEntry::from_snapshot(snapshot));
    } else {
        debug!(
            timestamp = %snapshot.timestamp,
            "Snapshot already recorded; history left unchanged"
        );
    }

    let entries = history.entries();
    let current = entries.last().map_or_else(BTreeMap::new, |current| {
        let previous = entries.len().checked_sub(2).map(|i| &entries[i]);
        with_deltas(current, previous)
    });

    if history.len() > max_entries {
        history = downsample(&history, max_entries);
    }

    Ok(MergeOutcome {
        history,
        current,
        appended,
    })
}

/// Metrics of `current` plus delta fields against `previous`.
///
/// Derived keys already present on `current` (from older documents) are
/// dropped so deltas never compound.
#[must_use]
pub fn with_deltas(
    current: &HistoryEntry,
    previous: Option<&HistoryEntry>,
) -> BTreeMap<String, MetricValue> {
    let mut metrics: BTreeMap<String, MetricValue> = current
        .numeric_metrics()
        .into_iter()
        .filter(|(key, _)| !is_derived_metric(key))
        .collect();
    let Some(previous) = previous else {
        return metrics;
    };

    let deltas: Vec<(String, MetricValue, MetricValue)> = metrics
        .iter()
        .filter_map(|(key, curr)| {
            let prev = previous.metric(key)?;
            (prev.as_f64() > 0.0).then(|| (key.clone(), *curr, prev))
        })
        .collect();

    for (key, curr, prev) in deltas {
        let change = (curr.as_f64() - prev.as_f64()) / prev.as_f64() * 100.0;
        metrics.insert(format!("{key}{CHANGE_SUFFIX}"), MetricValue::Float(change));
        metrics.insert(format!("{PREV_PREFIX}{key}"), prev);
    }
    metrics
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_utils::{history_from_offsets, snapshot_at_offset};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_empty_history_gets_one_entry_without_deltas() {
        let snapshot = snapshot_at_offset(0).with_metric("x", 10_i64);
        let outcome = merge(History::new(), &snapshot, 30).unwrap();
        assert!(outcome.appended);
        assert_eq!(outcome.history.len(), 1);
        assert!(outcome.current.keys().all(|k| !is_derived_metric(k)));
        assert_eq!(outcome.current["x"], MetricValue::Int(10));
    }

    #[test]
    fn test_delta_correctness() {
        let first = snapshot_at_offset(0).with_metric("x", 100_i64);
        let second = snapshot_at_offset(60).with_metric("x", 120_i64);
        let outcome = merge(History::new(), &first, 30).unwrap();
        let outcome = merge(outcome.history, &second, 30).unwrap();

        assert!((outcome.change("x").unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(outcome.previous("x"), Some(MetricValue::Int(100)));
        assert_eq!(outcome.current["x"], MetricValue::Int(120));
    }

    #[test]
    fn test_duplicate_detection_compares_timestamp_text() {
        let seconds = MetricsSnapshot::new("2025-01-01T00:00:00Z", BTreeMap::new());
        let millis = MetricsSnapshot::new("2025-01-01T00:00:00.000Z", BTreeMap::new());
        let outcome = merge(History::new(), &seconds, 30).unwrap();
        let outcome = merge(outcome.history, &millis, 30).unwrap();
        assert!(outcome.appended);
        assert_eq!(outcome.history.len(), 2);
    }

    #[test]
    fn test_negative_change() {
        let first = snapshot_at_offset(0).with_metric("latency", 200.0);
        let second = snapshot_at_offset(1).with_metric("latency", 150.0);
        let outcome = merge(History::new(), &first, 30).unwrap();
        let outcome = merge(outcome.history, &second, 30).unwrap();
        assert!((outcome.change("latency").unwrap() + 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_previous_yields_no_change() {
        let first = snapshot_at_offset(0).with_metric("y", 0_i64);
        let second = snapshot_at_offset(1).with_metric("y", 5_i64);
        let outcome = merge(History::new(), &first, 30).unwrap();
        let outcome = merge(outcome.history, &second, 30).unwrap();
        assert!(!outcome.current.contains_key("y_change"));
        assert!(!outcome.current.contains_key("prev_y"));
    }

    #[test]
    fn test_negative_previous_yields_no_change() {
        let first = snapshot_at_offset(0).with_metric("y", -3.0);
        let second = snapshot_at_offset(1).with_metric("y", 5.0);
        let outcome = merge(History::new(), &first, 30).unwrap();
        let outcome = merge(outcome.history, &second, 30).unwrap();
        assert_eq!(outcome.change("y"), None);
    }

    #[test]
    fn test_new_metric_has_no_delta() {
        let first = snapshot_at_offset(0).with_metric("x", 1_i64);
        let second = snapshot_at_offset(1)
            .with_metric("x", 2_i64)
            .with_metric("z", 9_i64);
        let outcome = merge(History::new(), &first, 30).unwrap();
        let outcome = merge(outcome.history, &second, 30).unwrap();
        assert!(outcome.change("x").is_some());
        assert!(outcome.change("z").is_none());
    }

    #[test]
    fn test_duplicate_timestamp_is_not_appended() {
        let first = snapshot_at_offset(0).with_metric("x", 100_i64);
        let second = snapshot_at_offset(60).with_metric("x", 120_i64);
        let rerun = snapshot_at_offset(60).with_metric("x", 999_i64);

        let outcome = merge(History::new(), &first, 30).unwrap();
        let outcome = merge(outcome.history, &second, 30).unwrap();
        let before = outcome.history.clone();
        let outcome = merge(outcome.history, &rerun, 30).unwrap();

        assert!(!outcome.appended);
        assert_eq!(outcome.history, before);
        // deltas are reported for the stored last entry
        assert_eq!(outcome.current["x"], MetricValue::Int(120));
        assert!((outcome.change("x").unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_derived_fields_are_not_stored() {
        let first = snapshot_at_offset(0).with_metric("x", 100_i64);
        let second = snapshot_at_offset(1).with_metric("x", 120_i64);
        let outcome = merge(History::new(), &first, 30).unwrap();
        let outcome = merge(outcome.history, &second, 30).unwrap();
        for entry in &outcome.history {
            assert!(entry.fields.keys().all(|k| !is_derived_metric(k)));
        }
    }

    #[test]
    fn test_legacy_derived_fields_do_not_compound() {
        let mut legacy = HistoryEntry::from_snapshot(&snapshot_at_offset(0).with_metric("x", 100_i64));
        legacy
            .fields
            .insert("x_change".into(), serde_json::json!(50.0));
        let history = History::from(vec![legacy]);
        let outcome = merge(history, &snapshot_at_offset(1).with_metric("x", 110_i64), 30).unwrap();
        assert!((outcome.change("x").unwrap() - 10.0).abs() < 1e-9);
        assert!(!outcome.current.contains_key("x_change_change"));
    }

    #[test]
    fn test_invalid_snapshot_timestamp_is_an_error() {
        let snapshot = MetricsSnapshot::new("last tuesday", BTreeMap::new());
        let err = merge(History::new(), &snapshot, 30).unwrap_err();
        assert_eq!(
            err,
            SnapshotError::InvalidTimestamp {
                timestamp: "last tuesday".into()
            }
        );
    }

    #[test]
    fn test_over_cap_is_downsampled_keeping_newest() {
        let history = history_from_offsets(&[0, 10, 20, 30]);
        let snapshot = snapshot_at_offset(40).with_metric("x", 1_i64);
        let outcome = merge(history, &snapshot, 3).unwrap();
        assert_eq!(outcome.history.len(), 3);
        assert_eq!(
            outcome.history.last().unwrap().timestamp,
            snapshot.timestamp
        );
    }

    #[test]
    fn test_deltas_use_entry_before_compaction() {
        // the entry right before the new one is evicted by compaction, but
        // the delta still compares against it
        let history = History::from(vec![
            HistoryEntry::from_snapshot(&snapshot_at_offset(0).with_metric("x", 10_i64)),
            HistoryEntry::from_snapshot(&snapshot_at_offset(100).with_metric("x", 40_i64)),
            HistoryEntry::from_snapshot(&snapshot_at_offset(101).with_metric("x", 50_i64)),
        ]);
        let snapshot = snapshot_at_offset(102).with_metric("x", 100_i64);
        let outcome = merge(history, &snapshot, 3).unwrap();
        assert_eq!(outcome.previous("x"), Some(MetricValue::Int(50)));
        assert!((outcome.change("x").unwrap() - 100.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_duplicate_merge_keeps_length(offsets in prop::collection::vec(0_i64..500, 1..30)) {
            let mut offsets = offsets;
            offsets.sort_unstable();
            offsets.dedup();
            let history = history_from_offsets(&offsets);
            let last = *offsets.last().unwrap();
            let outcome = merge(history.clone(), &snapshot_at_offset(last), 1_000).unwrap();
            prop_assert_eq!(outcome.history.len(), history.len());
            prop_assert!(!outcome.appended);
        }
    }
}
