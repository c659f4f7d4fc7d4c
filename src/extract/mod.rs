//! Snapshot extraction from benchmark tool output.
//!
//! Each extractor turns one tool's output into a [`MetricsSnapshot`]
//! stamped by a [`TimeProvider`](crate::traits::TimeProvider):
//! - [`extract_criterion`]: Criterion `estimates.json` tree
//! - [`extract_gungraun`]: Callgrind summary or Gungraun terminal output
//! - [`extract_quality`]: quality benchmark text report
//!
//! # Strict and permissive extraction
//!
//! With `strict = true` a missing source or missing required metric is an
//! [`ExtractError`]. With `strict = false` the extractor logs a warning and
//! returns `Ok(None)`, so nothing is appended to history. Neither mode
//! invents placeholder values.
//!
//! Text formats with several layouts are handled by a list of named
//! [`Strategy`] values tried in order until one matches.

mod criterion;
mod gungraun;
mod quality;

pub use criterion::{extract_criterion, CriterionBenchmark};
pub use gungraun::{
    extract_gungraun, parse_gungraun_benchmarks, GungraunBenchmark, ParsedGungraun,
    GUNGRAUN_STRATEGIES,
};
pub use quality::{extract_quality, FieldKind, QualityField, QUALITY_FIELDS};

use crate::error::ExtractError;
use crate::history::{MetricValue, MetricsSnapshot};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// A snapshot plus any extra document fields the extractor produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// The extracted snapshot.
    pub snapshot: MetricsSnapshot,
    /// Extra top-level document fields (e.g. per-benchmark details).
    pub extra: Map<String, Value>,
}

impl Extracted {
    /// Wrap a snapshot without extra fields.
    #[must_use]
    pub fn new(snapshot: MetricsSnapshot) -> Self {
        Self {
            snapshot,
            extra: Map::new(),
        }
    }

    /// Attach an extra top-level field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Metrics parsed from one layout of a tool's output.
pub type ParsedMetrics = BTreeMap<String, MetricValue>;

/// A named parser for one output layout.
#[derive(Clone, Copy)]
pub struct Strategy<T> {
    /// Name used in logs.
    pub name: &'static str,
    /// Returns `None` when the content is not in this layout.
    pub parse: fn(&str) -> Option<T>,
}

/// Run `strategies` in order and return the first match with its name.
pub fn first_match<T>(strategies: &[Strategy<T>], content: &str) -> Option<(&'static str, T)> {
    strategies
        .iter()
        .find_map(|strategy| (strategy.parse)(content).map(|parsed| (strategy.name, parsed)))
}

/// Read a text source, applying the missing-source policy.
pub(crate) fn read_source(
    category: &str,
    path: &Path,
    strict: bool,
) -> Result<Option<String>, ExtractError> {
    if !path.exists() {
        return missing_source(category, path, strict);
    }
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|e| ExtractError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

pub(crate) fn missing_source<T>(
    category: &str,
    path: &Path,
    strict: bool,
) -> Result<Option<T>, ExtractError> {
    if strict {
        return Err(ExtractError::SourceNotFound {
            category: category.into(),
            path: path.to_path_buf(),
        });
    }
    warn!(category, path = %path.display(), "Source not found; skipping");
    Ok(None)
}

pub(crate) fn missing_metric<T>(
    category: &str,
    metric: &str,
    strict: bool,
) -> Result<Option<T>, ExtractError> {
    if strict {
        return Err(ExtractError::MissingRequiredMetric {
            category: category.into(),
            metric: metric.into(),
        });
    }
    warn!(category, metric, "Required metric not found; skipping");
    Ok(None)
}

/// Compile a pattern literal.
#[allow(clippy::expect_used)]
pub(crate) fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("pattern literal must compile")
}

/// First capture group of `re` in `content`, as a thousands-separated count.
pub(crate) fn capture_count(re: &Regex, content: &str) -> Option<u64> {
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

/// First capture group of `re` in `content`, as a float.
pub(crate) fn capture_float(re: &Regex, content: &str) -> Option<f64> {
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
