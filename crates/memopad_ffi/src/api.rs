//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the memo UI action surface as sync functions via FRB.
//! - Translate core errors into envelopes with human-readable messages.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call loads the collection, applies one action and persists it
//!   while holding `ENTRY_LOCK`, so concurrent callers never lose writes.

use log::warn;
use memopad_core::{
    core_version as core_version_inner, export_file_name, format_timestamp,
    init_logging as init_logging_inner, ping as ping_inner, Clock, ListView, Note, NoteSession,
    SaveOutcome, SessionError, SqliteKvStore, SystemClock,
};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

const ENTRY_DB_FILE_NAME: &str = "memopad.sqlite3";
static ENTRY_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static ENTRY_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One note as rendered by the list and detail views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: i64,
    pub content: String,
    /// Epoch milliseconds of the last change.
    pub last_modified: i64,
    /// `YYYY-MM-DD HH:MM` label in device local time.
    pub date_label: String,
    pub is_important: bool,
}

/// List response for the filtered/searched note view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesListResponse {
    /// Visible notes in repository order.
    pub items: Vec<NoteItem>,
    /// Total notes stored, regardless of filter.
    pub total: u32,
    /// Empty-state placeholder, or empty string when items exist.
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected note, when there is one.
    pub note: Option<NoteItem>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl NoteActionResponse {
    fn success(message: impl Into<String>, note: Option<NoteItem>) -> Self {
        Self {
            ok: true,
            note,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note: None,
            message: message.into(),
        }
    }
}

/// Export payload returned to the UI for download/share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    pub file_name: String,
    pub document: String,
    pub message: String,
}

/// Import result; `committed=false` means validated only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResponse {
    pub ok: bool,
    pub committed: bool,
    pub added_count: u32,
    pub message: String,
}

/// Lists notes under search term + importance filter.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; store failures come back as `message` with no items.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_list(search_term: String, important_only: bool) -> NotesListResponse {
    let result = with_session(|session| {
        session.search(search_term);
        if important_only {
            session.toggle_filter();
        }
        let total = u32::try_from(session.repository().len()).unwrap_or(u32::MAX);
        let view = session.view();
        let items = view.items().iter().map(|note| to_note_item(note)).collect();
        let message = match view {
            ListView::Items(_) => String::new(),
            ListView::NoNotes | ListView::NoMatches => session.empty_message().to_string(),
        };
        Ok(NotesListResponse {
            items,
            total,
            message,
        })
    });

    result.unwrap_or_else(|err| NotesListResponse {
        items: Vec::new(),
        total: 0,
        message: format!("notes_list failed: {err}"),
    })
}

/// Fetches one note for the detail/editor view.
#[flutter_rust_bridge::frb(sync)]
pub fn note_get(id: i64) -> NoteActionResponse {
    match with_session(|session| Ok(session.repository().find_by_id(id).map(to_note_item))) {
        Ok(Some(item)) => NoteActionResponse::success("Note loaded.", Some(item)),
        Ok(None) => NoteActionResponse::failure(format!("note not found: {id}")),
        Err(err) => NoteActionResponse::failure(format!("note_get failed: {err}")),
    }
}

/// Saves editor content: creates when `editing_id` is `None`, else updates.
///
/// # FFI contract
/// - Blank content is rejected with `ok=false`; nothing is written.
/// - Editing a note that no longer exists is rejected with `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn note_save(editing_id: Option<i64>, content: String, important: bool) -> NoteActionResponse {
    let result = with_session(|session| {
        if let Some(id) = editing_id {
            if session.open_detail(id).is_none() {
                return Err(SessionError::Repo(memopad_core::RepoError::NotFound(id)));
            }
        }
        session.set_important_mode(important);
        session.save(&content)
    });

    match result {
        Ok(SaveOutcome::Created(note)) => {
            NoteActionResponse::success("Note saved.", Some(to_note_item(&note)))
        }
        Ok(SaveOutcome::Updated(note)) => {
            NoteActionResponse::success("Note updated.", Some(to_note_item(&note)))
        }
        Err(err) => NoteActionResponse::failure(format!("note_save failed: {err}")),
    }
}

/// Deletes one note; deleting an unknown id still reports success.
#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(id: i64) -> NoteActionResponse {
    match with_session(|session| session.delete(id)) {
        Ok(true) => NoteActionResponse::success("Note deleted.", None),
        Ok(false) => NoteActionResponse::success("Nothing to delete.", None),
        Err(err) => NoteActionResponse::failure(format!("note_delete failed: {err}")),
    }
}

/// Serializes the whole, unfiltered collection for download.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_export() -> ExportResponse {
    let file_name = export_file_name(SystemClock.now_millis());
    match with_session(|session| session.export()) {
        Ok(document) => ExportResponse {
            ok: true,
            file_name,
            document,
            message: "Backup ready.".to_string(),
        },
        Err(err) => ExportResponse {
            ok: false,
            file_name,
            document: String::new(),
            message: format!("notes_export failed: {err}"),
        },
    }
}

/// Validates a backup and, when `confirmed`, merges it into local notes.
///
/// Call once with `confirmed=false` to show the user how many notes would be
/// added, then again with `confirmed=true` to apply. Declining simply means
/// never making the second call.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_import(file_name: String, contents: String, confirmed: bool) -> ImportResponse {
    let result = with_session(|session| {
        memopad_core::transfer::import::ensure_json_file_name(&file_name)?;
        let payload = memopad_core::transfer::import::parse_import_bytes(contents.as_bytes())?;
        let pending = session.prepare_import(&payload)?;
        let would_add = pending.added_count();
        if !confirmed {
            return Ok((false, would_add));
        }
        Ok((true, session.commit_import(pending)?))
    });

    match result {
        Ok((committed, added)) => ImportResponse {
            ok: true,
            committed,
            added_count: u32::try_from(added).unwrap_or(u32::MAX),
            message: if committed {
                format!("Imported {added} note(s).")
            } else {
                format!("{added} note(s) will be imported.")
            },
        },
        Err(err) => ImportResponse {
            ok: false,
            committed: false,
            added_count: 0,
            message: format!("notes_import failed: {err}"),
        },
    }
}

fn resolve_entry_db_path() -> PathBuf {
    ENTRY_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("MEMOPAD_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(ENTRY_DB_FILE_NAME)
        })
        .clone()
}

fn with_session<T>(
    f: impl FnOnce(&mut NoteSession<SqliteKvStore>) -> Result<T, SessionError>,
) -> Result<T, String> {
    // A poisoned lock only means an earlier call panicked; the store is still
    // consistent because writes are whole-document.
    let _guard = ENTRY_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let store = SqliteKvStore::open(resolve_entry_db_path())
        .map_err(|err| format!("entry DB open failed: {err}"))?;
    let mut session =
        NoteSession::open(store, SystemClock).map_err(|err| format!("entry load failed: {err}"))?;
    f(&mut session).map_err(|err| {
        warn!(
            "event=ffi_call module=ffi status=error kind={:?}",
            err.kind()
        );
        err.to_string()
    })
}

fn to_note_item(note: &Note) -> NoteItem {
    NoteItem {
        id: note.id,
        content: note.content.clone(),
        last_modified: note.last_modified,
        date_label: format_timestamp(note.last_modified),
        is_important: note.is_important,
    }
}
