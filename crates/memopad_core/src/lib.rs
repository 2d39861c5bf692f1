//! Core domain logic for Memopad.
//! This crate is the single source of truth for note invariants.

pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod store;
pub mod transfer;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::clock::{Clock, IdSource, ManualClock, SystemClock};
pub use model::note::{Note, NoteId, NoteValidationError};
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, DEFAULT_NOTES_KEY};
pub use search::projection::{
    empty_message, format_timestamp, format_timestamp_with_offset, project, ListView, ViewFilter,
};
pub use service::note_service::{
    EditorState, ErrorKind, NoteSession, PendingImport, SaveOutcome, SessionError, SessionResult,
};
pub use store::{KvStore, MemoryKvStore, SqliteKvStore, StoreError, StoreResult};
pub use transfer::export::{export_document, export_file_name, write_export_file};
pub use transfer::import::{merge, read_import_file, MergeOutcome};
pub use transfer::{TransferError, TransferResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
