//! Quality benchmark text reports.

use super::{
    capture_count, capture_float, missing_metric, pattern, read_source, Extracted, ParsedMetrics,
};
use crate::config::QUALITY;
use crate::error::ExtractError;
use crate::history::{MetricValue, MetricsSnapshot};
use crate::traits::TimeProvider;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// How a captured field is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Decimal value.
    Float,
    /// Integer count.
    Count,
}

/// One metric read from a quality report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityField {
    /// Metric name in the snapshot.
    pub metric: &'static str,
    /// Pattern whose first group holds the value.
    pub pattern: &'static str,
    /// Stored representation.
    pub kind: FieldKind,
}

/// Fields read from a quality report, in report order.
pub const QUALITY_FIELDS: [QualityField; 5] = [
    QualityField {
        metric: "success_rate",
        pattern: r"Success Rate:\s*(\d+\.?\d*)%",
        kind: FieldKind::Float,
    },
    QualityField {
        metric: "avg_score",
        pattern: r"Average Score:\s*(\d+\.?\d*)",
        kind: FieldKind::Float,
    },
    QualityField {
        metric: "total_tests",
        pattern: r"Total Tests:\s*(\d+)",
        kind: FieldKind::Count,
    },
    QualityField {
        metric: "passed_tests",
        pattern: r"Passed:\s*(\d+)",
        kind: FieldKind::Count,
    },
    QualityField {
        metric: "failed_tests",
        pattern: r"Failed:\s*(\d+)",
        kind: FieldKind::Count,
    },
];

static COMPILED: LazyLock<Vec<(QualityField, Regex)>> = LazyLock::new(|| {
    QUALITY_FIELDS
        .iter()
        .map(|field| (*field, pattern(field.pattern)))
        .collect()
});

/// Extract a snapshot from a quality benchmark report.
///
/// Strict mode requires every field in [`QUALITY_FIELDS`]. Permissive mode
/// keeps whichever fields are present and skips the report if none are.
///
/// # Errors
///
/// In strict mode, returns [`ExtractError::SourceNotFound`] if the file is
/// missing and [`ExtractError::MissingRequiredMetric`] naming the first
/// absent field. Returns [`ExtractError::Read`] if the file cannot be read.
pub fn extract_quality(
    path: &Path,
    strict: bool,
    clock: &dyn TimeProvider,
) -> Result<Option<Extracted>, ExtractError> {
    let Some(content) = read_source(QUALITY, path, strict)? else {
        return Ok(None);
    };

    let mut metrics = ParsedMetrics::new();
    for (field, re) in COMPILED.iter() {
        let value = match field.kind {
            FieldKind::Float => capture_float(re, &content).map(MetricValue::Float),
            FieldKind::Count => capture_count(re, &content).map(MetricValue::from),
        };
        match value {
            Some(value) => {
                metrics.insert(field.metric.to_string(), value);
            }
            None if strict => return missing_metric(QUALITY, field.metric, true),
            None => warn!(metric = field.metric, "Quality field not found"),
        }
    }

    if metrics.is_empty() {
        return missing_metric(QUALITY, "success_rate", strict);
    }
    debug!(fields = metrics.len(), "Parsed quality report");

    let mut snapshot = MetricsSnapshot::at(clock.now());
    snapshot.metrics = metrics;
    Ok(Some(Extracted::new(snapshot)))
}
