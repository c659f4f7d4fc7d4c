//! Snapshot and history value types.
//!
//! History entries are stored flattened: the observation timestamp sits next
//! to the metric values at the top level of each JSON object.

// Epoch seconds are carried as f64 for scoring
#![allow(clippy::cast_precision_loss)]

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Suffix of derived percent-change fields.
pub const CHANGE_SUFFIX: &str = "_change";

/// Prefix of derived previous-value fields.
pub const PREV_PREFIX: &str = "prev_";

/// A single numeric metric value.
///
/// Integers and floats are kept apart so counters round-trip through JSON
/// without picking up a trailing `.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Integer counter.
    Int(i64),
    /// Floating-point measurement.
    Float(f64),
}

impl MetricValue {
    /// Numeric view of the value.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
        }
    }

    /// Read a metric from an arbitrary JSON value.
    ///
    /// Returns `None` for anything that is not a JSON number.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        value
            .as_i64()
            .map(Self::Int)
            .or_else(|| value.as_f64().map(Self::Float))
    }

    /// Convert to a JSON value. Non-finite floats become `null`.
    #[must_use]
    pub fn to_json(self) -> Value {
        match self {
            Self::Int(v) => Value::from(v),
            Self::Float(v) => serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::Float(value as f64), Self::Int)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// True for keys the merger derives (`*_change`, `prev_*`).
///
/// Derived keys must never be written back into stored history entries.
#[must_use]
pub fn is_derived_metric(key: &str) -> bool {
    key.ends_with(CHANGE_SUFFIX) || key.starts_with(PREV_PREFIX)
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (`Z` or numeric offset) and naive
/// `YYYY-MM-DDTHH:MM:SS[.fraction]`, which is read as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a timestamp into fractional seconds since the Unix epoch.
#[must_use]
pub fn epoch_seconds(raw: &str) -> Option<f64> {
    parse_timestamp(raw).map(|dt| dt.timestamp_micros() as f64 / 1_000_000.0)
}

/// One observation instant plus its named metric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// ISO-8601 observation instant; the natural key of the snapshot.
    pub timestamp: String,
    /// Metric name to value.
    pub metrics: BTreeMap<String, MetricValue>,
}

impl MetricsSnapshot {
    /// Create a snapshot from a raw timestamp string.
    #[must_use]
    pub fn new(timestamp: impl Into<String>, metrics: BTreeMap<String, MetricValue>) -> Self {
        Self {
            timestamp: timestamp.into(),
            metrics,
        }
    }

    /// Create an empty snapshot stamped with `at` in RFC 3339 UTC.
    #[must_use]
    pub fn at(at: DateTime<Utc>) -> Self {
        Self::new(at.to_rfc3339_opts(SecondsFormat::Millis, true), BTreeMap::new())
    }

    /// Rebuild a snapshot from a persisted document's `metrics` object,
    /// dropping derived delta fields.
    #[must_use]
    pub fn from_document_metrics(
        timestamp: impl Into<String>,
        metrics: &BTreeMap<String, MetricValue>,
    ) -> Self {
        let metrics = metrics
            .iter()
            .filter(|(key, _)| !is_derived_metric(key))
            .map(|(key, value)| (key.clone(), *value))
            .collect();
        Self::new(timestamp, metrics)
    }

    /// Add or replace a metric.
    #[must_use]
    pub fn with_metric(mut self, name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.metrics.insert(name.into(), value.into());
        self
    }

    /// Epoch seconds of the timestamp, if it parses.
    #[must_use]
    pub fn epoch_seconds(&self) -> Option<f64> {
        epoch_seconds(&self.timestamp)
    }
}

/// A flattened history entry: `{"timestamp": ..., "<metric>": <value>, ...}`.
///
/// Fields other than `timestamp` are kept verbatim, including non-numeric
/// ones written by older tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// ISO-8601 observation instant. Empty when the source omitted it.
    #[serde(default)]
    pub timestamp: String,
    /// Every other field of the entry.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl HistoryEntry {
    /// Flatten a snapshot into a history entry.
    #[must_use]
    pub fn from_snapshot(snapshot: &MetricsSnapshot) -> Self {
        let fields = snapshot
            .metrics
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        Self {
            timestamp: snapshot.timestamp.clone(),
            fields,
        }
    }

    /// Numeric value of a metric, if present and numeric.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<MetricValue> {
        self.fields.get(name).and_then(MetricValue::from_json)
    }

    /// All numeric fields of the entry.
    #[must_use]
    pub fn numeric_metrics(&self) -> BTreeMap<String, MetricValue> {
        self.fields
            .iter()
            .filter_map(|(key, value)| MetricValue::from_json(value).map(|v| (key.clone(), v)))
            .collect()
    }

    /// Epoch seconds of the timestamp, if it parses.
    #[must_use]
    pub fn epoch_seconds(&self) -> Option<f64> {
        epoch_seconds(&self.timestamp)
    }
}

impl From<&MetricsSnapshot> for HistoryEntry {
    fn from(snapshot: &MetricsSnapshot) -> Self {
        Self::from_snapshot(snapshot)
    }
}

/// Ordered sequence of history entries, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<HistoryEntry>);

impl History {
    /// Create an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in stored order.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.0.last()
    }

    /// Iterate entries in stored order.
    pub fn iter(&self) -> std::slice::Iter<'_, HistoryEntry> {
        self.0.iter()
    }

    /// Epoch seconds for every entry; `None` where the timestamp is unparseable.
    #[must_use]
    pub fn epoch_seconds(&self) -> Vec<Option<f64>> {
        self.0.iter().map(HistoryEntry::epoch_seconds).collect()
    }

    /// Consume into the underlying entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<HistoryEntry> {
        self.0
    }

    pub(crate) fn push(&mut self, entry: HistoryEntry) {
        self.0.push(entry);
    }
}

impl From<Vec<HistoryEntry>> for History {
    fn from(entries: Vec<HistoryEntry>) -> Self {
        Self(entries)
    }
}

impl FromIterator<HistoryEntry> for History {
    fn from_iter<I: IntoIterator<Item = HistoryEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryEntry;
    type IntoIter = std::slice::Iter<'a, HistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
