//! Import reconciler.
//!
//! # Responsibility
//! - Read user-supplied backup files (`.json` only).
//! - Validate every record before anything is merged.
//! - Prepend surviving incoming notes ahead of the existing sequence.
//!
//! # Invariants
//! - Validation is whole-batch: partial imports never happen.
//! - Incoming records colliding with an existing id are dropped.
//! - Within one batch the first occurrence of an id wins.
//! - Relative order of both incoming and existing notes is preserved.

use super::{TransferError, TransferResult};
use crate::model::note::Note;
use log::{info, warn};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

/// Result of reconciling an incoming collection with existing notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Incoming survivors followed by every existing note.
    pub merged: Vec<Note>,
    /// Number of incoming notes actually added.
    pub added_count: usize,
}

/// Merges a raw incoming collection into `existing`.
///
/// # Errors
/// - [`TransferError::Format`] when `incoming` is not an array or any record
///   fails validation. Nothing is merged in that case.
pub fn merge(existing: &[Note], incoming: &Value) -> TransferResult<MergeOutcome> {
    let records = parse_records(incoming)?;
    let received = records.len();

    let mut seen: HashSet<i64> = existing.iter().map(|note| note.id).collect();
    let survivors: Vec<Note> = records
        .into_iter()
        .filter(|note| seen.insert(note.id))
        .collect();

    let added_count = survivors.len();
    if added_count < received {
        warn!(
            "event=import_dedup module=transfer status=ok received={} dropped={}",
            received,
            received - added_count
        );
    }

    let mut merged = survivors;
    merged.extend(existing.iter().cloned());
    info!(
        "event=import_merge module=transfer status=ok added={} total={}",
        added_count,
        merged.len()
    );

    Ok(MergeOutcome {
        merged,
        added_count,
    })
}

/// Validates a raw collection into notes, preserving order.
///
/// # Errors
/// - [`TransferError::Format`] naming the first offending record.
pub fn parse_records(incoming: &Value) -> TransferResult<Vec<Note>> {
    let Some(items) = incoming.as_array() else {
        return Err(TransferError::format("expected an array of notes"));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_record(index, item))
        .collect()
}

/// Reads and parses a backup file from disk.
///
/// # Errors
/// - [`TransferError::Format`] when the name lacks a `.json` extension (checked
///   before any read) or the contents are not JSON.
/// - [`TransferError::Io`] when the file cannot be read.
pub fn read_import_file(path: impl AsRef<Path>) -> TransferResult<Value> {
    let path = path.as_ref();
    ensure_json_file_name(&path.to_string_lossy())?;
    let bytes = std::fs::read(path).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_import_bytes(&bytes)
}

/// Parses raw backup bytes as JSON.
pub fn parse_import_bytes(bytes: &[u8]) -> TransferResult<Value> {
    serde_json::from_slice(bytes)
        .map_err(|err| TransferError::format(format!("not a JSON document: {err}")))
}

/// Rejects file names that do not end in `.json` (case-insensitive).
pub fn ensure_json_file_name(file_name: &str) -> TransferResult<()> {
    if file_name.trim().to_ascii_lowercase().ends_with(".json") {
        Ok(())
    } else {
        Err(TransferError::format(format!(
            "only .json files can be imported, got `{file_name}`"
        )))
    }
}

fn parse_record(index: usize, item: &Value) -> TransferResult<Note> {
    let Some(fields) = item.as_object() else {
        return Err(TransferError::record(index, "expected an object"));
    };

    let id = required_i64(index, fields, "id")?;
    if id == 0 {
        return Err(TransferError::record(index, "field `id` must be non-zero"));
    }
    if id == i64::MAX {
        return Err(TransferError::record(index, "field `id` is out of range"));
    }

    let content = match fields.get("content") {
        Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
        Some(Value::String(_)) => {
            return Err(TransferError::record(index, "field `content` is empty"));
        }
        _ => {
            return Err(TransferError::record(
                index,
                "field `content` must be a string",
            ));
        }
    };

    let last_modified = required_i64(index, fields, "date")?;
    if last_modified == i64::MAX {
        return Err(TransferError::record(index, "field `date` is out of range"));
    }

    let Some(is_important) = fields.get("isImportant").and_then(Value::as_bool) else {
        return Err(TransferError::record(
            index,
            "field `isImportant` must be a boolean",
        ));
    };

    Ok(Note {
        id,
        content,
        last_modified,
        is_important,
    })
}

fn required_i64(index: usize, fields: &Map<String, Value>, name: &str) -> TransferResult<i64> {
    fields.get(name).and_then(Value::as_i64).ok_or_else(|| {
        TransferError::record(index, format!("field `{name}` must be an integer"))
    })
}

#[cfg(test)]
mod tests {
    use super::{ensure_json_file_name, merge, parse_records};
    use crate::model::note::Note;
    use crate::transfer::TransferError;
    use serde_json::json;

    fn existing() -> Vec<Note> {
        vec![Note {
            id: 1,
            content: "local".to_string(),
            last_modified: 10,
            is_important: false,
        }]
    }

    #[test]
    fn colliding_ids_are_dropped_and_new_ones_prepended() {
        let incoming = json!([
            {"id": 1, "content": "dup", "date": 5, "isImportant": true},
            {"id": 2, "content": "new", "date": 7, "isImportant": false}
        ]);
        let outcome = merge(&existing(), &incoming).unwrap();
        assert_eq!(outcome.added_count, 1);
        let ids: Vec<_> = outcome.merged.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(outcome.merged[1].content, "local");
    }

    #[test]
    fn duplicate_ids_inside_batch_keep_first() {
        let incoming = json!([
            {"id": 7, "content": "first", "date": 1, "isImportant": false},
            {"id": 7, "content": "second", "date": 2, "isImportant": false}
        ]);
        let outcome = merge(&[], &incoming).unwrap();
        assert_eq!(outcome.added_count, 1);
        assert_eq!(outcome.merged[0].content, "first");
    }

    #[test]
    fn non_array_payload_is_rejected() {
        let err = merge(&existing(), &json!({"id": 1})).unwrap_err();
        assert!(matches!(err, TransferError::Format { index: None, .. }));
    }

    #[test]
    fn one_invalid_record_rejects_whole_batch() {
        let incoming = json!([
            {"id": 2, "content": "fine", "date": 7, "isImportant": false},
            {"id": 3, "date": 7, "isImportant": false}
        ]);
        let err = parse_records(&incoming).unwrap_err();
        match err {
            TransferError::Format { index, message } => {
                assert_eq!(index, Some(1));
                assert!(message.contains("content"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn record_field_rules() {
        let cases = [
            json!([{"id": 0, "content": "x", "date": 1, "isImportant": false}]),
            json!([{"id": "1", "content": "x", "date": 1, "isImportant": false}]),
            json!([{"id": 1, "content": "   ", "date": 1, "isImportant": false}]),
            json!([{"id": 1, "content": "x", "date": null, "isImportant": false}]),
            json!([{"id": 1, "content": "x", "date": 1, "isImportant": "yes"}]),
            json!([{"id": 1, "content": "x", "date": 1}]),
            json!([{"id": i64::MAX, "content": "x", "date": 1, "isImportant": false}]),
            json!([{"id": 1, "content": "x", "date": i64::MAX, "isImportant": false}]),
            json!(["not an object"]),
        ];
        for case in cases {
            assert!(parse_records(&case).is_err(), "accepted {case}");
        }
    }

    #[test]
    fn zero_timestamp_is_accepted() {
        let incoming = json!([{"id": 4, "content": "epoch", "date": 0, "isImportant": true}]);
        let notes = parse_records(&incoming).unwrap();
        assert_eq!(notes[0].last_modified, 0);
        assert!(notes[0].is_important);
    }

    #[test]
    fn file_name_must_end_in_json() {
        assert!(ensure_json_file_name("backup.json").is_ok());
        assert!(ensure_json_file_name("BACKUP.JSON").is_ok());
        assert!(ensure_json_file_name(".json").is_ok());
        assert!(ensure_json_file_name(" notes.json ").is_ok());
        assert!(ensure_json_file_name("backup.json.txt").is_err());
        assert!(ensure_json_file_name("backup.txt").is_err());
        assert!(ensure_json_file_name("json").is_err());
    }
}
