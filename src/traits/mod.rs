//! Trait definitions for mockable dependencies.
//!
//! This module defines traits for:
//! - [`HistoryStore`]: Persisted history document access
//! - [`TimeProvider`]: Time abstraction for testing
//!
//! # Mocking
//!
//! All traits are annotated with `#[cfg_attr(test, mockall::automock)]`
//! which generates mock implementations automatically for testing.
//!
//! # Example
//!
//! ```
//! use bench_history::traits::{TimeProvider, RealTimeProvider};
//!
//! let time_provider = RealTimeProvider;
//! let now = time_provider.now();
//! println!("Current time: {now}");
//! ```

use chrono::{DateTime, Utc};
use std::path::Path;

use crate::error::StoreError;
use crate::store::HistoryDocument;

/// Persisted history document access.
///
/// The store exclusively owns the documents; callers follow a plain
/// read-modify-write discipline and must serialize writers themselves.
#[cfg_attr(test, mockall::automock)]
pub trait HistoryStore: Send + Sync {
    /// Load the document at `path`.
    ///
    /// Returns `None` if no document exists there.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] if the document exists but cannot
    /// be read or parsed.
    fn load(&self, path: &Path) -> Result<Option<HistoryDocument>, StoreError>;

    /// Replace the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriteFailed`] if the document cannot be written.
    fn save(&self, path: &Path, document: &HistoryDocument) -> Result<(), StoreError>;
}

/// Time provider trait for deterministic testing.
///
/// This trait abstracts time operations to allow for
/// deterministic testing by providing fixed timestamps.
#[cfg_attr(test, mockall::automock)]
pub trait TimeProvider: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Real time provider using system clock.
///
/// This is the production implementation that returns the actual current time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
