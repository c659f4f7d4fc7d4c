//! Persisted history documents.
//!
//! This module provides:
//! - [`HistoryDocument`]: the `{timestamp, type, metrics, history}` JSON shape
//! - [`JsonFileStore`]: file-backed [`HistoryStore`](crate::traits::HistoryStore)
//!   with atomic replace-on-write
//! - [`load_history`]: the missing/malformed document policy
//!
//! # Example
//!
//! ```no_run
//! use bench_history::store::{load_history, JsonFileStore, LoadMode};
//! use std::path::Path;
//!
//! let loaded = load_history(&JsonFileStore, Path::new(".benchmark-history/perf-history.json"), LoadMode::Strict)?;
//! if let Some(warning) = &loaded.warning {
//!     eprintln!("{warning}");
//! }
//! println!("{} entries", loaded.history.len());
//! # Ok::<(), bench_history::error::StoreError>(())
//! ```

mod document;
mod file;
mod policy;

pub use document::HistoryDocument;
pub use file::JsonFileStore;
pub use policy::{load_history, LoadMode, LoadedHistory, StoreWarning};
