//! Missing and malformed document policy.

use super::HistoryDocument;
use crate::error::StoreError;
use crate::history::History;
use crate::traits::HistoryStore;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// How to treat a persisted document that exists but cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Malformed documents abort the run.
    #[default]
    Strict,
    /// Malformed documents are discarded and history starts fresh.
    Permissive,
}

impl LoadMode {
    /// `Strict` when `strict` is true.
    #[must_use]
    pub const fn from_strict(strict: bool) -> Self {
        if strict {
            Self::Strict
        } else {
            Self::Permissive
        }
    }
}

/// Non-fatal conditions surfaced while loading history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWarning {
    /// No document existed; history starts empty.
    MissingSource {
        /// The path that was looked up.
        path: PathBuf,
    },
    /// The document was unreadable and has been discarded.
    MalformedDocument {
        /// The offending path.
        path: PathBuf,
        /// Why it could not be used.
        message: String,
    },
}

impl fmt::Display for StoreWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSource { path } => {
                write!(f, "No history at {}; starting fresh", path.display())
            }
            Self::MalformedDocument { path, message } => write!(
                f,
                "Discarding unreadable history at {}: {message}",
                path.display()
            ),
        }
    }
}

/// Result of [`load_history`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedHistory {
    /// The full document, when one was loaded.
    pub document: Option<HistoryDocument>,
    /// Its history, or empty.
    pub history: History,
    /// Set when the history had to start empty.
    pub warning: Option<StoreWarning>,
}

/// Load the history stored at `path`, applying the document policy.
///
/// - missing document: empty history plus [`StoreWarning::MissingSource`];
/// - malformed document in [`LoadMode::Strict`]: error;
/// - malformed document in [`LoadMode::Permissive`]: empty history plus
///   [`StoreWarning::MalformedDocument`].
///
/// Warnings are also logged.
///
/// # Errors
///
/// Returns [`StoreError::Malformed`] for unreadable documents in strict mode.
pub fn load_history<S>(store: &S, path: &Path, mode: LoadMode) -> Result<LoadedHistory, StoreError>
where
    S: HistoryStore + ?Sized,
{
    let warning = match store.load(path) {
        Ok(Some(mut document)) => {
            let history = std::mem::take(&mut document.history);
            return Ok(LoadedHistory {
                document: Some(document),
                history,
                warning: None,
            });
        }
        Ok(None) => StoreWarning::MissingSource {
            path: path.to_path_buf(),
        },
        Err(StoreError::Malformed { path, message }) if mode == LoadMode::Permissive => {
            StoreWarning::MalformedDocument { path, message }
        }
        Err(e) => return Err(e),
    };

    warn!("{warning}");
    Ok(LoadedHistory {
        document: None,
        history: History::new(),
        warning: Some(warning),
    })
}
