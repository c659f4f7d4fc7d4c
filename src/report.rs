//! Markdown report for Gungraun terminal output.

use crate::extract::GungraunBenchmark;
use std::fmt::Write;

const TITLE: &str = "# Gungraun Benchmark Results\n\n";

/// Render Gungraun benchmarks as a Markdown summary plus per-benchmark table.
///
/// # Example
///
/// ```
/// use bench_history::report::render_gungraun_report;
///
/// let report = render_gungraun_report(&[]);
/// assert!(report.contains("No benchmarks found"));
/// ```
#[must_use]
pub fn render_gungraun_report(benchmarks: &[GungraunBenchmark]) -> String {
    let mut out = String::from(TITLE);
    if benchmarks.is_empty() {
        out.push_str("No benchmarks found in output.\n");
        return out;
    }

    let count = benchmarks.len() as u64;
    let total = |f: fn(&GungraunBenchmark) -> u64| -> u64 { benchmarks.iter().map(f).sum() };
    let rows = [
        ("Instructions", total(|b| b.instructions)),
        ("Estimated Cycles", total(|b| b.estimated_cycles)),
        ("L1 Accesses", total(|b| b.l1_accesses)),
        ("L2 Accesses", total(|b| b.l2_accesses)),
        ("RAM Accesses", total(|b| b.ram_accesses)),
    ];

    out.push_str("*High-precision instruction-level benchmarks using Valgrind Callgrind*\n\n");
    out.push_str("## Summary\n\n");
    let _ = writeln!(out, "**Total Benchmarks**: {count}\n");
    out.push_str("| Metric | Total | Average |\n");
    out.push_str("|--------|-------|--------|\n");
    for (label, sum) in rows {
        let _ = writeln!(
            out,
            "| {label} | {} | {} |",
            thousands(sum),
            thousands(sum / count)
        );
    }

    out.push_str("\n## Individual Benchmarks\n\n");
    out.push_str("| Benchmark | Instructions | Est. Cycles | L1 Access | L2 Access | RAM Access |\n");
    out.push_str("|-----------|--------------|-------------|-----------|-----------|------------|\n");
    for b in benchmarks {
        let _ = writeln!(
            out,
            "| `{}` | {} | {} | {} | {} | {} |",
            b.name,
            thousands(b.instructions),
            thousands(b.estimated_cycles),
            thousands(b.l1_accesses),
            thousands(b.l2_accesses),
            thousands(b.ram_accesses),
        );
    }

    out.push_str("\n---\n*Generated by bench-history*\n");
    out
}

/// Format with `,` thousands separators.
fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
