//! Backup export and import reconciliation.
//!
//! # Responsibility
//! - Serialize the full note collection into a portable JSON backup.
//! - Validate an external collection and merge it without clobbering
//!   existing notes.
//!
//! # Invariants
//! - Import is all-or-nothing: one bad record rejects the whole batch.
//! - Existing notes always win on id collision.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod export;
pub mod import;

pub type TransferResult<T> = Result<T, TransferError>;

/// Failure while reading, validating or writing a backup document.
#[derive(Debug)]
pub enum TransferError {
    /// Payload is not a valid note collection.
    Format {
        /// Offending record position, when the failure is record-level.
        index: Option<usize>,
        message: String,
    },
    /// Backup file could not be read or written.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Collection could not be serialized.
    Encode(serde_json::Error),
}

impl TransferError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format {
            index: None,
            message: message.into(),
        }
    }

    pub(crate) fn record(index: usize, message: impl Into<String>) -> Self {
        Self::Format {
            index: Some(index),
            message: message.into(),
        }
    }
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format {
                index: Some(index),
                message,
            } => write!(f, "invalid backup record #{index}: {message}"),
            Self::Format {
                index: None,
                message,
            } => write!(f, "invalid backup format: {message}"),
            Self::Io { path, source } => {
                write!(f, "backup file `{}` is not accessible: {source}", path.display())
            }
            Self::Encode(err) => write!(f, "failed to encode backup: {err}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format { .. } => None,
            Self::Io { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
        }
    }
}
