//! Load, merge and save for one benchmark category.

use crate::config::Category;
use crate::error::{AppError, StoreError};
use crate::extract::Extracted;
use crate::history::{downsample, merge};
use crate::store::{load_history, HistoryDocument, LoadMode, StoreWarning};
use crate::traits::HistoryStore;
use std::path::{Path, PathBuf};
use tracing::info;

/// Parameters shared by every category in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSettings {
    /// Directory holding `*-history.json` documents.
    pub history_dir: PathBuf,
    /// Directory receiving `*-latest.json` documents.
    pub output_dir: PathBuf,
    /// History cap.
    pub max_history: usize,
    /// Policy for unreadable stored documents.
    pub load_mode: LoadMode,
}

/// What [`update_category`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryReport {
    /// Category name.
    pub category: String,
    /// Entries in the saved history.
    pub history_len: usize,
    /// False when the snapshot duplicated the last stored entry.
    pub appended: bool,
    /// Set when the stored history could not be used.
    pub warning: Option<StoreWarning>,
    /// Where the history document was written.
    pub history_path: PathBuf,
    /// Where the latest document was written.
    pub latest_path: PathBuf,
}

/// Merge one extracted snapshot into its category's stored history.
///
/// The resulting document is written to both the history directory and
/// the output directory.
///
/// # Errors
///
/// Returns [`AppError::Store`] if the stored document is malformed in
/// strict mode or a write fails, and [`AppError::Snapshot`] if the
/// snapshot's timestamp is invalid.
pub fn update_category<S>(
    store: &S,
    category: &Category,
    extracted: Extracted,
    settings: &UpdateSettings,
) -> Result<CategoryReport, AppError>
where
    S: HistoryStore + ?Sized,
{
    let history_path = category.history_path(&settings.history_dir);
    let latest_path = category.latest_path(&settings.output_dir);

    let loaded = load_history(store, &history_path, settings.load_mode)?;
    let outcome = merge(loaded.history, &extracted.snapshot, settings.max_history)?;
    let appended = outcome.appended;

    let document = HistoryDocument::from_merge(&category.name, &extracted.snapshot, outcome)
        .with_extra(extracted.extra);
    let history_len = document.history.len();

    store.save(&history_path, &document)?;
    store.save(&latest_path, &document)?;

    info!(
        category = %category.name,
        history_len,
        appended,
        path = %latest_path.display(),
        "Updated benchmark history"
    );

    Ok(CategoryReport {
        category: category.name.clone(),
        history_len,
        appended,
        warning: loaded.warning,
        history_path,
        latest_path,
    })
}

/// Downsample the history of the document at `path` in place.
///
/// Returns the history length before and after.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] if
/// there is no document, or any load/save error.
pub fn compact_document<S>(
    store: &S,
    path: &Path,
    max_entries: usize,
) -> Result<(usize, usize), AppError>
where
    S: HistoryStore + ?Sized,
{
    let mut document = store
        .load(path)?
        .ok_or_else(|| StoreError::NotFound {
            path: path.to_path_buf(),
        })?;
    let before = document.history.len();
    document.history = downsample(&document.history, max_entries);
    let after = document.history.len();
    store.save(path, &document)?;
    info!(path = %path.display(), before, after, "Compacted history");
    Ok((before, after))
}
