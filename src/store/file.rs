//! File-backed JSON document store.

use super::HistoryDocument;
use crate::error::StoreError;
use crate::traits::HistoryStore;
use std::io::ErrorKind;
use std::path::Path;

/// Stores each document as a pretty-printed JSON file.
///
/// Writes go to a sibling `.tmp` file which is then renamed over the target,
/// so readers never observe a half-written document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileStore;

impl HistoryStore for JsonFileStore {
    fn load(&self, path: &Path) -> Result<Option<HistoryDocument>, StoreError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Malformed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Malformed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn save(&self, path: &Path, document: &HistoryDocument) -> Result<(), StoreError> {
        let write_failed = |message: String| StoreError::WriteFailed {
            path: path.to_path_buf(),
            message,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| write_failed(format!("Failed to create directory: {e}")))?;
        }

        let json = serde_json::to_string_pretty(document)
            .map_err(|e| write_failed(format!("Failed to serialize document: {e}")))?;

        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, json)
            .map_err(|e| write_failed(format!("Failed to write temp file: {e}")))?;
        std::fs::rename(&tmp_path, path)
            .map_err(|e| write_failed(format!("Failed to replace document: {e}")))?;

        tracing::debug!(path = %path.display(), entries = document.history.len(), "Saved history document");
        Ok(())
    }
}
