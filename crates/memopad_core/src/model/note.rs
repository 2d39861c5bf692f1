//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical memo record shared by storage, export and import.
//! - Own the content validation rule applied at every write boundary.
//!
//! # Invariants
//! - `id` is unique inside one repository and never reassigned.
//! - Persisted notes always carry non-empty trimmed `content`.
//! - `last_modified` uses the same millisecond clock source as `id`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier of one note.
///
/// Derived from the creation timestamp (epoch milliseconds), so ordering by
/// id also orders by creation time.
pub type NoteId = i64;

/// Single user-authored memo.
///
/// Field names on the wire follow the document format shared by the local
/// store and backup files: `id`, `content`, `date`, `isImportant`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    /// Primary key and creation-order tiebreaker.
    pub id: NoteId,
    /// Memo body, stored trimmed.
    pub content: String,
    /// Epoch milliseconds of the last content or importance change.
    #[serde(rename = "date")]
    pub last_modified: i64,
    /// Starred flag used by the importance filter.
    #[serde(rename = "isImportant")]
    pub is_important: bool,
}

impl Note {
    /// Builds a fresh note whose `last_modified` equals its `id`.
    ///
    /// # Errors
    /// - Returns [`NoteValidationError::EmptyContent`] for blank content.
    pub fn new(id: NoteId, content: &str, is_important: bool) -> Result<Self, NoteValidationError> {
        let content = normalize_content(content)?;
        Ok(Self {
            id,
            content,
            last_modified: id,
            is_important,
        })
    }

    /// Replaces content and importance, stamping `last_modified`.
    ///
    /// Leaves `self` untouched when validation fails.
    pub fn revise(
        &mut self,
        content: &str,
        is_important: bool,
        stamp: i64,
    ) -> Result<(), NoteValidationError> {
        let content = normalize_content(content)?;
        self.content = content;
        self.is_important = is_important;
        self.last_modified = stamp;
        Ok(())
    }

    /// Checks the persisted-content invariant.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.content.trim().is_empty() {
            return Err(NoteValidationError::EmptyContent);
        }
        Ok(())
    }
}

/// Validation failure for note writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Content is empty or whitespace-only.
    EmptyContent,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "note content must not be empty"),
        }
    }
}

impl Error for NoteValidationError {}

/// Trims surrounding whitespace and rejects blank content.
pub fn normalize_content(content: &str) -> Result<String, NoteValidationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(NoteValidationError::EmptyContent);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{normalize_content, Note, NoteValidationError};

    #[test]
    fn new_note_uses_id_as_first_timestamp() {
        let note = Note::new(1000, "  Buy milk \n", false).unwrap();
        assert_eq!(note.id, 1000);
        assert_eq!(note.last_modified, 1000);
        assert_eq!(note.content, "Buy milk");
        assert!(!note.is_important);
    }

    #[test]
    fn blank_content_is_rejected() {
        assert_eq!(
            normalize_content(" \t\n").unwrap_err(),
            NoteValidationError::EmptyContent
        );
        assert!(Note::new(1, "", true).is_err());
    }

    #[test]
    fn failed_revise_keeps_previous_state() {
        let mut note = Note::new(5, "draft", false).unwrap();
        let before = note.clone();
        assert!(note.revise("   ", true, 9).is_err());
        assert_eq!(note, before);

        note.revise("final", true, 9).unwrap();
        assert_eq!(note.content, "final");
        assert!(note.is_important);
        assert_eq!(note.last_modified, 9);
        assert_eq!(note.id, 5);
    }

    #[test]
    fn serializes_with_document_field_names() {
        let note = Note::new(42, "hello", true).unwrap();
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 42,
                "content": "hello",
                "date": 42,
                "isImportant": true
            })
        );
    }
}
