//! Gungraun and Callgrind instruction-level output.
//!
//! Two layouts are recognised, tried in this order:
//!
//! 1. `callgrind-summary`: Valgrind's end-of-run summary
//!    (`I refs:`, `total heap usage:`, `D refs:`, `D1 misses:`).
//! 2. `gungraun-terminal`: Gungraun's per-benchmark blocks
//!    (`Instructions:`, `L1`/`L2`/`LL`/`RAM` accesses or hits,
//!    `Estimated Cycles:`).

#![allow(clippy::cast_precision_loss)]

use super::{
    capture_count, first_match, missing_metric, pattern, read_source, Extracted, ParsedMetrics,
    Strategy,
};
use crate::config::GUNGRAUN;
use crate::error::ExtractError;
use crate::history::{MetricValue, MetricsSnapshot};
use crate::traits::TimeProvider;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static I_REFS: LazyLock<Regex> = LazyLock::new(|| pattern(r"I\s+refs:\s+([\d,]+)"));
static HEAP_ALLOCS: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"total heap usage:\s+([\d,]+)\s+allocs"));
static HEAP_BYTES: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"total heap usage:.*?([\d,]+)\s+bytes allocated"));
static D_REFS: LazyLock<Regex> = LazyLock::new(|| pattern(r"D\s+refs:\s+([\d,]+)"));
static D1_MISSES: LazyLock<Regex> = LazyLock::new(|| pattern(r"D1\s+misses:\s+([\d,]+)"));

static BENCH_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"([a-zA-Z_][a-zA-Z0-9_/:\-]+)[ \t]*\n?\s*Instructions:\s*([\d,]+)")
});
static L1: LazyLock<Regex> = LazyLock::new(|| pattern(r"L1 (?:Accesses|Hits):\s+([\d,]+)"));
static L2: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?:L2|LL) (?:Accesses|Hits):\s+([\d,]+)"));
static RAM: LazyLock<Regex> = LazyLock::new(|| pattern(r"RAM (?:Accesses|Hits):\s+([\d,]+)"));
static CYCLES: LazyLock<Regex> = LazyLock::new(|| pattern(r"Estimated Cycles:\s+([\d,]+)"));

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// One benchmark block from Gungraun terminal output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GungraunBenchmark {
    /// Benchmark path as printed.
    pub name: String,
    /// Instruction count.
    pub instructions: u64,
    /// L1 accesses or hits.
    pub l1_accesses: u64,
    /// L2 / last-level accesses or hits.
    pub l2_accesses: u64,
    /// RAM accesses or hits.
    pub ram_accesses: u64,
    /// Estimated cycles.
    pub estimated_cycles: u64,
}

/// Result of a Gungraun layout parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedGungraun {
    /// Aggregate metrics.
    pub metrics: ParsedMetrics,
    /// Per-benchmark blocks, when the layout has them.
    pub benchmarks: Vec<GungraunBenchmark>,
}

/// Layout parsers, in the order they are tried.
pub const GUNGRAUN_STRATEGIES: [Strategy<ParsedGungraun>; 2] = [
    Strategy {
        name: "callgrind-summary",
        parse: parse_callgrind_summary,
    },
    Strategy {
        name: "gungraun-terminal",
        parse: parse_terminal,
    },
];

/// Extract a snapshot from a Gungraun/Callgrind output file.
///
/// # Errors
///
/// In strict mode, returns [`ExtractError::SourceNotFound`] if the file is
/// missing and [`ExtractError::MissingRequiredMetric`] if no layout matches.
/// Returns [`ExtractError::Read`] if the file cannot be read.
pub fn extract_gungraun(
    path: &Path,
    strict: bool,
    clock: &dyn TimeProvider,
) -> Result<Option<Extracted>, ExtractError> {
    let Some(content) = read_source(GUNGRAUN, path, strict)? else {
        return Ok(None);
    };
    let Some((layout, parsed)) = first_match(&GUNGRAUN_STRATEGIES, &content) else {
        return missing_metric(GUNGRAUN, "total_instructions", strict);
    };
    debug!(layout, metrics = parsed.metrics.len(), "Parsed Gungraun output");

    let mut snapshot = MetricsSnapshot::at(clock.now());
    snapshot.metrics = parsed.metrics;
    let mut extracted = Extracted::new(snapshot);
    if !parsed.benchmarks.is_empty() {
        let details = serde_json::to_value(&parsed.benchmarks).unwrap_or(Value::Null);
        extracted = extracted.with_extra("benchmarks", details);
    }
    Ok(Some(extracted))
}

fn parse_callgrind_summary(content: &str) -> Option<ParsedGungraun> {
    let instructions = capture_count(&I_REFS, content)?;
    let mut metrics = ParsedMetrics::new();
    metrics.insert("total_instructions".into(), instructions.into());

    if let Some(allocs) = capture_count(&HEAP_ALLOCS, content) {
        metrics.insert("total_allocations".into(), allocs.into());
    }
    if let Some(bytes) = capture_count(&HEAP_BYTES, content) {
        metrics.insert("bytes_allocated".into(), bytes.into());
        metrics.insert(
            "peak_memory_mb".into(),
            MetricValue::Float(bytes as f64 / BYTES_PER_MIB),
        );
    }
    let refs = capture_count(&D_REFS, content);
    if let Some(refs) = refs {
        metrics.insert("cache_references".into(), refs.into());
    }
    if let Some(misses) = capture_count(&D1_MISSES, content) {
        metrics.insert("cache_misses".into(), misses.into());
        if let Some(refs) = refs.filter(|r| *r > 0) {
            metrics.insert(
                "cache_miss_rate".into(),
                MetricValue::Float(misses as f64 / refs as f64 * 100.0),
            );
        }
    }

    Some(ParsedGungraun {
        metrics,
        benchmarks: Vec::new(),
    })
}

fn parse_terminal(content: &str) -> Option<ParsedGungraun> {
    let benchmarks = parse_gungraun_benchmarks(content);
    if benchmarks.is_empty() {
        return None;
    }

    let sum = |f: fn(&GungraunBenchmark) -> u64| -> u64 { benchmarks.iter().map(f).sum() };
    let mut metrics = ParsedMetrics::new();
    metrics.insert("total_benchmarks".into(), (benchmarks.len() as u64).into());
    metrics.insert("total_instructions".into(), sum(|b| b.instructions).into());
    metrics.insert("estimated_cycles".into(), sum(|b| b.estimated_cycles).into());
    metrics.insert("l1_accesses".into(), sum(|b| b.l1_accesses).into());
    metrics.insert("l2_accesses".into(), sum(|b| b.l2_accesses).into());
    metrics.insert("ram_accesses".into(), sum(|b| b.ram_accesses).into());

    Some(ParsedGungraun {
        metrics,
        benchmarks,
    })
}

/// Parse every benchmark block of Gungraun terminal output.
///
/// Counters absent from a block are reported as zero.
#[must_use]
pub fn parse_gungraun_benchmarks(content: &str) -> Vec<GungraunBenchmark> {
    let headers: Vec<_> = BENCH_HEADER.captures_iter(content).collect();

    headers
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str().trim().to_string();
            let instructions = caps.get(2)?.as_str().replace(',', "").parse().ok()?;
            let end = headers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(content.len(), |m| m.start());
            let section = &content[whole.end()..end];

            Some(GungraunBenchmark {
                name,
                instructions,
                l1_accesses: capture_count(&L1, section).unwrap_or(0),
                l2_accesses: capture_count(&L2, section).unwrap_or(0),
                ram_accesses: capture_count(&RAM, section).unwrap_or(0),
                estimated_cycles: capture_count(&CYCLES, section).unwrap_or(0),
            })
        })
        .collect()
}
