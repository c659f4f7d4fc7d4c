//! Benchmark history binary entry point.
//!
//! Logs go to stderr; progress lines and rendered reports go to stdout.
//!
//! Coverage is excluded because the command dispatch is exercised through
//! the library's integration tests.

// Enable the coverage attribute when running with nightly for llvm-cov exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use bench_history::backfill::{backfill_category, LATEST_FILE};
use bench_history::config::{
    default_categories, validate_config, Config, CRITERION, DEFAULT_LOG_LEVEL, GUNGRAUN, QUALITY,
};
use bench_history::error::{AppError, ExtractError, StoreError};
use bench_history::extract::{
    extract_criterion, extract_gungraun, extract_quality, parse_gungraun_benchmarks,
};
use bench_history::pipeline::{compact_document, update_category, UpdateSettings};
use bench_history::report::render_gungraun_report;
use bench_history::store::{JsonFileStore, LoadMode};
use bench_history::traits::RealTimeProvider;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, warn};
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bench-history")]
#[command(about = "Benchmark metric history for trend dashboards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract every category, merge into history, write latest documents
    Parse {
        /// Criterion output directory
        #[arg(long, default_value = "target/criterion")]
        criterion_dir: PathBuf,

        /// Gungraun or Callgrind output file
        #[arg(long, default_value = "gungraun-results.md")]
        gungraun_output: PathBuf,

        /// Quality benchmark report
        #[arg(long, default_value = "quality-results.md")]
        quality_results: PathBuf,

        /// Directory for `*-latest.json` (overrides BENCH_OUTPUT_DIR)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Directory for `*-history.json` (overrides BENCH_HISTORY_DIR)
        #[arg(long)]
        history_dir: Option<PathBuf>,

        /// History cap (overrides BENCH_MAX_HISTORY)
        #[arg(long)]
        max_history: Option<usize>,

        /// Skip missing sources and discard unreadable history
        #[arg(long)]
        permissive: bool,
    },

    /// Rebuild `latest.json` histories from archived snapshots
    Backfill {
        /// Data directory holding `<category>/<stamp>.json` archives
        #[arg(long)]
        gh_pages_data: PathBuf,

        /// Directory holding `<category>/latest.json`
        #[arg(long, default_value = "benchmarks/data")]
        benchmark_data: PathBuf,

        /// Which category to backfill
        #[arg(long, value_enum, default_value_t = BenchType::All)]
        bench_type: BenchType,

        /// History cap (overrides BENCH_BACKFILL_MAX_HISTORY)
        #[arg(long)]
        max_history: Option<usize>,
    },

    /// Render Gungraun terminal output as Markdown
    Report {
        /// Gungraun output file
        input: PathBuf,

        /// Output file (prints to stdout if omitted)
        output: Option<PathBuf>,
    },

    /// Downsample a document's history in place
    Compact {
        /// History or latest document
        file: PathBuf,

        /// History cap (defaults to BENCH_MAX_HISTORY)
        #[arg(long)]
        max_entries: Option<usize>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum BenchType {
    Criterion,
    Gungraun,
    Quality,
    All,
}

impl BenchType {
    fn categories(self) -> Vec<&'static str> {
        match self {
            Self::Criterion => vec![CRITERION],
            Self::Gungraun => vec![GUNGRAUN],
            Self::Quality => vec![QUALITY],
            Self::All => vec![CRITERION, GUNGRAUN, QUALITY],
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration from environment (and .env) before logging starts
    let config = Config::from_env();
    init_tracing(
        config
            .as_ref()
            .map_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL), Config::log_filter),
    );
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Parse {
            criterion_dir,
            gungraun_output,
            quality_results,
            output_dir,
            history_dir,
            max_history,
            permissive,
        } => {
            let mut config = config;
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(dir) = history_dir {
                config.history_dir = dir;
            }
            if let Some(max) = max_history {
                config.max_history = max;
            }
            config.strict = config.strict && !permissive;
            validate_config(&config)
                .map_err(AppError::from)
                .map(|()| run_parse(&config, &criterion_dir, &gungraun_output, &quality_results))
        }
        Commands::Backfill {
            gh_pages_data,
            benchmark_data,
            bench_type,
            max_history,
        } => {
            let mut config = config;
            if let Some(max) = max_history {
                config.backfill_max_history = max;
            }
            validate_config(&config).map_err(AppError::from).map(|()| {
                run_backfill(
                    &gh_pages_data,
                    &benchmark_data,
                    bench_type,
                    config.backfill_max_history,
                )
            })
        }
        Commands::Report { input, output } => run_report(&input, output.as_deref()),
        Commands::Compact { file, max_entries } => {
            let mut config = config;
            if let Some(max) = max_entries {
                config.max_history = max;
            }
            validate_config(&config)
                .map_err(AppError::from)
                .and_then(|()| compact_document(&JsonFileStore, &file, config.max_history))
                .map(|(before, after)| {
                    println!("Compacted {}: {before} -> {after} entries", file.display());
                    true
                })
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging to stderr. `LOG_FORMAT=json` selects JSON lines.
fn init_tracing(filter: EnvFilter) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Returns false if any category failed.
fn run_parse(
    config: &Config,
    criterion_dir: &Path,
    gungraun_output: &Path,
    quality_results: &Path,
) -> bool {
    let clock = RealTimeProvider;
    let settings = UpdateSettings {
        history_dir: config.history_dir.clone(),
        output_dir: config.output_dir.clone(),
        max_history: config.max_history,
        load_mode: LoadMode::from_strict(config.strict),
    };

    println!("Parsing benchmark results...");
    let mut ok = true;
    for category in default_categories() {
        let extracted = match category.name.as_str() {
            CRITERION => extract_criterion(criterion_dir, config.strict, &clock),
            GUNGRAUN => extract_gungraun(gungraun_output, config.strict, &clock),
            QUALITY => extract_quality(quality_results, config.strict, &clock),
            other => {
                warn!(category = other, "No extractor for category");
                continue;
            }
        };

        let result = extracted.map_err(AppError::from).and_then(|extracted| {
            extracted
                .map(|e| update_category(&JsonFileStore, &category, e, &settings))
                .transpose()
        });
        match result {
            Ok(Some(report)) => println!(
                "  {}: {} history entries -> {}",
                report.category,
                report.history_len,
                report.latest_path.display()
            ),
            Ok(None) => println!("  {}: skipped", category.name),
            Err(e) => {
                error!(category = %category.name, "{e}");
                println!("  {}: failed", category.name);
                ok = false;
            }
        }
    }
    ok
}

/// Returns false if any category failed.
fn run_backfill(
    gh_pages_data: &Path,
    benchmark_data: &Path,
    bench_type: BenchType,
    max_entries: usize,
) -> bool {
    let mut ok = true;
    for name in bench_type.categories() {
        let latest = benchmark_data.join(name).join(LATEST_FILE);
        match backfill_category(&JsonFileStore, &latest, gh_pages_data, name, max_entries) {
            Ok(entries) => println!(
                "Backfilled {entries} history entries into {}",
                latest.display()
            ),
            Err(e) => {
                error!(category = name, "{e}");
                ok = false;
            }
        }
    }
    ok
}

fn run_report(input: &Path, output: Option<&Path>) -> Result<bool, AppError> {
    let content = std::fs::read_to_string(input).map_err(|e| ExtractError::Read {
        path: input.to_path_buf(),
        message: e.to_string(),
    })?;
    let markdown = render_gungraun_report(&parse_gungraun_benchmarks(&content));

    match output {
        Some(path) => {
            std::fs::write(path, markdown).map_err(|e| StoreError::WriteFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            println!("Markdown report written to: {}", path.display());
        }
        None => print!("{markdown}"),
    }
    Ok(true)
}
