//! Criterion `target/criterion` results.

#![allow(clippy::cast_precision_loss)]

use super::{missing_metric, missing_source, Extracted};
use crate::config::CRITERION;
use crate::error::ExtractError;
use crate::history::MetricsSnapshot;
use crate::traits::TimeProvider;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// One Criterion benchmark group's mean estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionBenchmark {
    /// Group directory name.
    pub name: String,
    /// Mean time in milliseconds.
    pub mean_time_ms: f64,
    /// Mean time in nanoseconds.
    pub mean_time_ns: f64,
    /// Standard deviation point estimate (nanoseconds), when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
}

/// Outcome of reading one group's `estimates.json`.
enum GroupEstimate {
    Parsed(CriterionBenchmark),
    /// The file parsed but carries no `mean.point_estimate`.
    MissingMean(String),
    /// No estimates file, or it could not be read or parsed.
    Unavailable,
}

/// Extract a snapshot from a Criterion output directory.
///
/// Reads `<dir>/<group>/base/estimates.json` for every group except
/// `report`. Files that fail to parse are logged and skipped.
///
/// Metrics: `total_benchmarks`, `avg_time_ms`, `total_time_ms`. The
/// per-group estimates are attached as the `benchmarks` document field.
///
/// # Errors
///
/// In strict mode, returns [`ExtractError::SourceNotFound`] if `dir` does not
/// exist and [`ExtractError::MissingRequiredMetric`] if no group has an
/// estimate or a group's estimates lack a mean. Returns
/// [`ExtractError::Read`] if `dir` cannot be listed.
pub fn extract_criterion(
    dir: &Path,
    strict: bool,
    clock: &dyn TimeProvider,
) -> Result<Option<Extracted>, ExtractError> {
    if !dir.is_dir() {
        return missing_source(CRITERION, dir, strict);
    }

    let benchmarks = read_benchmarks(dir, strict)?;
    if benchmarks.is_empty() {
        return missing_metric(CRITERION, "total_benchmarks", strict);
    }

    let total_time_ms: f64 = benchmarks.iter().map(|b| b.mean_time_ms).sum();
    let count = benchmarks.len();
    let snapshot = MetricsSnapshot::at(clock.now())
        .with_metric("total_benchmarks", count as u64)
        .with_metric("avg_time_ms", total_time_ms / count as f64)
        .with_metric("total_time_ms", total_time_ms);

    debug!(count, total_time_ms, "Parsed Criterion estimates");
    let details = serde_json::to_value(&benchmarks).unwrap_or(Value::Null);
    Ok(Some(Extracted::new(snapshot).with_extra("benchmarks", details)))
}

fn read_benchmarks(dir: &Path, strict: bool) -> Result<Vec<CriterionBenchmark>, ExtractError> {
    let read_err = |e: std::io::Error| ExtractError::Read {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };

    let mut groups: Vec<_> = std::fs::read_dir(dir)
        .map_err(read_err)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && path.file_name().is_some_and(|n| n != "report"))
        .collect();
    groups.sort();

    let mut benchmarks = Vec::with_capacity(groups.len());
    for group in &groups {
        match read_estimate(group) {
            GroupEstimate::Parsed(benchmark) => benchmarks.push(benchmark),
            GroupEstimate::MissingMean(name) if strict => {
                return Err(ExtractError::MissingRequiredMetric {
                    category: CRITERION.into(),
                    metric: format!("{name}/mean"),
                });
            }
            GroupEstimate::MissingMean(name) => {
                warn!(group = %name, "Criterion estimates have no mean; skipping group");
            }
            GroupEstimate::Unavailable => {}
        }
    }
    Ok(benchmarks)
}

fn read_estimate(group: &Path) -> GroupEstimate {
    let estimates = group.join("base").join("estimates.json");
    if !estimates.exists() {
        return GroupEstimate::Unavailable;
    }
    let parsed = std::fs::read_to_string(&estimates)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(|e| e.to_string()));
    let value = match parsed {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %estimates.display(), error = %e, "Failed to parse Criterion estimates");
            return GroupEstimate::Unavailable;
        }
    };

    let point = |field: &str| {
        value
            .get(field)
            .and_then(|v| v.get("point_estimate"))
            .and_then(Value::as_f64)
    };
    let name = group
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let Some(mean_time_ns) = point("mean") else {
        return GroupEstimate::MissingMean(name);
    };
    GroupEstimate::Parsed(CriterionBenchmark {
        name,
        mean_time_ms: mean_time_ns / 1_000_000.0,
        mean_time_ns,
        std_dev: point("std_dev"),
    })
}
