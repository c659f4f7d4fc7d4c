//! Error types for bench-history.
//!
//! This module defines a hierarchical error system:
//! - [`AppError`]: Top-level application errors
//! - [`StoreError`]: Persisted document errors
//! - [`SnapshotError`]: Structurally invalid snapshots handed to the merger
//! - [`ExtractError`]: Tool output extraction errors
//! - [`ConfigError`]: Configuration errors
//!
//! All errors implement `Send + Sync`.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error.
///
/// This is the main error type returned by the pipeline and backfill jobs.
/// It wraps all subsystem errors for unified error handling.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Snapshot error.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Extraction error.
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Persisted document errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A document that must exist was not found.
    #[error("Document not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The document could not be read or parsed.
    #[error("Malformed document {}: {message}", path.display())]
    Malformed {
        /// The offending path.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// Writing the document failed.
    #[error("Write failed for {}: {message}", path.display())]
    WriteFailed {
        /// The target path.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

/// Snapshot errors.
///
/// Only structurally invalid input is an error; empty or degenerate
/// histories are always accepted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The snapshot timestamp is not a well-formed instant.
    #[error("Invalid snapshot timestamp: {timestamp:?}")]
    InvalidTimestamp {
        /// The raw timestamp string.
        timestamp: String,
    },
}

/// Extraction errors raised at the extractor boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The tool output file or directory does not exist.
    #[error("{category} source not found: {}", path.display())]
    SourceNotFound {
        /// Benchmark category.
        category: String,
        /// The missing path.
        path: PathBuf,
    },

    /// A metric required in strict mode is missing.
    #[error("{category} output is missing required metric: {metric}")]
    MissingRequiredMetric {
        /// Benchmark category.
        category: String,
        /// The missing metric name.
        metric: String,
    },

    /// Reading the tool output failed.
    #[error("Failed to read {}: {message}", path.display())]
    Read {
        /// The path being read.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

/// Configuration errors.
///
/// These errors represent failures in configuration loading and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration value is invalid.
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: String,
        /// Why the value is invalid.
        reason: String,
    },
}
