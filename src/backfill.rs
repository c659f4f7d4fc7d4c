//! Rebuilding history from archived timestamped snapshot documents.
//!
//! The dashboard's data branch keeps one `<category>/<stamp>.json` file per
//! CI run next to a `latest.json`. Backfilling reads the archived files in
//! name order, compacts them and writes the result into `latest.json`.

use crate::error::{AppError, StoreError};
use crate::history::{downsample, is_derived_metric, merge, History, HistoryEntry};
use crate::traits::HistoryStore;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the category's current document.
pub const LATEST_FILE: &str = "latest.json";

/// Read every archived snapshot in `dir` into a history, oldest first.
///
/// Files are taken in file-name order; `latest.json` is excluded. Each file
/// must carry a top-level `timestamp` and a `metrics` object; derived
/// `*_change`/`prev_*` keys are dropped. Of consecutive files sharing a
/// timestamp only the first is kept. Unreadable files are logged and
/// skipped. A missing directory yields an empty history.
#[must_use]
pub fn load_timestamped_history(dir: &Path, max_entries: usize) -> History {
    let files = match snapshot_files(dir) {
        Ok(files) => files,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Snapshot directory unavailable");
            return History::new();
        }
    };

    let mut entries: Vec<HistoryEntry> = files.iter().filter_map(|path| read_entry(path)).collect();
    entries.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);
    let history = History::from(entries);
    debug!(dir = %dir.display(), files = files.len(), entries = history.len(), "Loaded snapshots");

    if history.len() > max_entries {
        downsample(&history, max_entries)
    } else {
        history
    }
}

fn snapshot_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|name| name != LATEST_FILE)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn read_entry(path: &Path) -> Option<HistoryEntry> {
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(|e| e.to_string()));
    let value = match parsed {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load snapshot");
            return None;
        }
    };

    let timestamp = value.get("timestamp").and_then(Value::as_str)?;
    let metrics = value.get("metrics").and_then(Value::as_object)?;
    let fields: Map<String, Value> = metrics
        .iter()
        .filter(|(key, _)| !is_derived_metric(key))
        .map(|(key, v)| (key.clone(), v.clone()))
        .collect();

    Some(HistoryEntry {
        timestamp: timestamp.to_string(),
        fields,
    })
}

/// Replace the history of the document at `latest_path` with one rebuilt
/// from `<data_dir>/<category>/`.
///
/// The document's own snapshot is merged onto the rebuilt history, so it
/// is not repeated when the archive already ends at its timestamp and the
/// result never exceeds `max_entries`. Returns the number of history
/// entries written.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] if there is no document at
/// `latest_path`, [`SnapshotError::InvalidTimestamp`] if the document's
/// timestamp is set but malformed, or any load/save error.
///
/// [`SnapshotError::InvalidTimestamp`]: crate::error::SnapshotError::InvalidTimestamp
pub fn backfill_category<S>(
    store: &S,
    latest_path: &Path,
    data_dir: &Path,
    category: &str,
    max_entries: usize,
) -> Result<usize, AppError>
where
    S: HistoryStore + ?Sized,
{
    let mut document = store.load(latest_path)?.ok_or_else(|| StoreError::NotFound {
        path: latest_path.to_path_buf(),
    })?;

    let archive = load_timestamped_history(&data_dir.join(category), max_entries);
    let history = if document.timestamp.is_empty() {
        archive
    } else {
        merge(archive, &document.snapshot(), max_entries)?.history
    };

    let written = history.len();
    document.history = history;
    store.save(latest_path, &document)?;

    info!(
        category,
        entries = written,
        path = %latest_path.display(),
        "Backfilled history"
    );
    Ok(written)
}
