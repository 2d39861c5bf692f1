//! Backup export.
//!
//! The export is the full, unfiltered collection in repository order, using
//! the same record shape the store persists.

use super::{TransferError, TransferResult};
use crate::model::note::Note;
use log::{error, info};
use std::path::{Path, PathBuf};

const EXPORT_FILE_PREFIX: &str = "memos-backup";

/// Serializes `notes` as a pretty-printed JSON array.
pub fn export_document(notes: &[Note]) -> TransferResult<String> {
    serde_json::to_string_pretty(notes).map_err(TransferError::Encode)
}

/// Backup file name embedding the export timestamp.
pub fn export_file_name(exported_at_ms: i64) -> String {
    format!("{EXPORT_FILE_PREFIX}-{exported_at_ms}.json")
}

/// Writes a backup of `notes` into `dir` and returns the file path.
///
/// # Errors
/// - [`TransferError::Io`] when the directory is not writable.
pub fn write_export_file(
    dir: impl AsRef<Path>,
    notes: &[Note],
    exported_at_ms: i64,
) -> TransferResult<PathBuf> {
    let path = dir.as_ref().join(export_file_name(exported_at_ms));
    let document = export_document(notes)?;
    if let Err(source) = std::fs::write(&path, document) {
        error!(
            "event=notes_export module=transfer status=error path={} error={}",
            path.display(),
            source
        );
        return Err(TransferError::Io { path, source });
    }

    info!(
        "event=notes_export module=transfer status=ok count={} path={}",
        notes.len(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{export_document, export_file_name};
    use crate::model::note::Note;

    #[test]
    fn file_name_embeds_timestamp() {
        assert_eq!(export_file_name(1700000000000), "memos-backup-1700000000000.json");
    }

    #[test]
    fn document_keeps_order_and_wire_names() {
        let notes = vec![
            Note::new(2, "b", true).unwrap(),
            Note::new(1, "a", false).unwrap(),
        ];
        let value: serde_json::Value =
            serde_json::from_str(&export_document(&notes).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"id": 2, "content": "b", "date": 2, "isImportant": true},
                {"id": 1, "content": "a", "date": 1, "isImportant": false}
            ])
        );
    }
}
