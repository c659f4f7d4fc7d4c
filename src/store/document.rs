//! The persisted `{..., history: [...]}` document.

use crate::history::{History, MergeOutcome, MetricValue, MetricsSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One persisted document per benchmark category.
///
/// `metrics` is the latest point plus derived `_change`/`prev_` fields;
/// `history` is the plotted series. Unknown top-level fields (for example
/// the per-benchmark list written for Criterion) are preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryDocument {
    /// Timestamp of the latest snapshot.
    #[serde(default)]
    pub timestamp: String,
    /// Category tag (`criterion`, `gungraun`, `quality`, ...).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Latest metrics plus derived delta fields.
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricValue>,
    /// Compacted history, oldest first.
    #[serde(default)]
    pub history: History,
    /// Any other top-level fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryDocument {
    /// Build a document from a merge outcome.
    #[must_use]
    pub fn from_merge(
        kind: impl Into<String>,
        snapshot: &MetricsSnapshot,
        outcome: MergeOutcome,
    ) -> Self {
        Self {
            timestamp: snapshot.timestamp.clone(),
            kind: kind.into(),
            metrics: outcome.current,
            history: outcome.history,
            extra: Map::new(),
        }
    }

    /// Attach extra top-level fields.
    #[must_use]
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra.extend(extra);
        self
    }

    /// The document's own latest snapshot, without derived fields.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::from_document_metrics(self.timestamp.clone(), &self.metrics)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_document_wire_shape() {
        let raw = json!({
            "timestamp": "2025-01-02T00:00:00Z",
            "type": "criterion",
            "metrics": {"avg_time_ms": 1.5, "avg_time_ms_change": 10.0, "prev_avg_time_ms": 1.25},
            "history": [
                {"timestamp": "2025-01-01T00:00:00Z", "avg_time_ms": 1.25},
                {"timestamp": "2025-01-02T00:00:00Z", "avg_time_ms": 1.5}
            ],
            "benchmarks": [{"name": "routing", "mean_time_ms": 1.5}]
        });
        let doc: HistoryDocument = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(doc.kind, "criterion");
        assert_eq!(doc.history.len(), 2);
        assert!(doc.extra.contains_key("benchmarks"));
        assert_eq!(serde_json::to_value(&doc).unwrap(), raw);
    }

    #[test]
    fn test_document_without_history_defaults_empty() {
        let doc: HistoryDocument = serde_json::from_value(json!({
            "timestamp": "2025-01-02T00:00:00Z",
            "type": "quality",
            "metrics": {"success_rate": 95.5}
        }))
        .unwrap();
        assert!(doc.history.is_empty());
    }

    #[test]
    fn test_snapshot_strips_derived_fields() {
        let doc: HistoryDocument = serde_json::from_value(json!({
            "timestamp": "2025-01-02T00:00:00Z",
            "type": "quality",
            "metrics": {"x": 120, "x_change": 20.0, "prev_x": 100}
        }))
        .unwrap();
        let snapshot = doc.snapshot();
        assert_eq!(snapshot.timestamp, "2025-01-02T00:00:00Z");
        assert_eq!(snapshot.metrics.keys().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn test_non_numeric_metric_is_rejected() {
        let result: Result<HistoryDocument, _> = serde_json::from_value(json!({
            "metrics": {"x": "fast"}
        }));
        assert!(result.is_err());
    }
}
