//! Note session: command handlers for the memo UI.
//!
//! # Responsibility
//! - Own the repository plus editor/list UI state for one session.
//! - Map each UI action (new, save, open, delete, search, filter, export,
//!   import) onto repository, projection or reconciler operations.
//!
//! # Invariants
//! - `save` creates when no note is being edited and updates in place
//!   otherwise; the editor is reset after every successful save.
//! - Import is two-phase; a dropped `PendingImport` changes nothing.
//! - A `PendingImport` only commits against the revision it was built from.

use crate::model::clock::Clock;
use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::{NoteRepository, RepoError};
use crate::search::projection::{empty_message, ListView, ViewFilter};
use crate::store::KvStore;
use crate::transfer::export::{export_document, write_export_file};
use crate::transfer::import::{merge, read_import_file};
use crate::transfer::TransferError;
use log::{info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Coarse error category used for user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Format,
    Storage,
    Io,
}

/// Service error for session command handlers.
#[derive(Debug)]
pub enum SessionError {
    Repo(RepoError),
    Transfer(TransferError),
    /// Repository changed after the pending import was prepared.
    StaleImport {
        prepared_at: u64,
        current: u64,
    },
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Repo(RepoError::Validation(_)) => ErrorKind::Validation,
            Self::Repo(RepoError::NotFound(_)) => ErrorKind::NotFound,
            Self::Repo(RepoError::DuplicateId(_)) => ErrorKind::Format,
            Self::Repo(RepoError::IdsExhausted) => ErrorKind::Storage,
            Self::Repo(RepoError::Store(_)) => ErrorKind::Storage,
            Self::Transfer(TransferError::Format { .. }) => ErrorKind::Format,
            Self::Transfer(TransferError::Io { .. }) => ErrorKind::Io,
            Self::Transfer(TransferError::Encode(_)) => ErrorKind::Storage,
            Self::StaleImport { .. } => ErrorKind::Format,
        }
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Transfer(err) => write!(f, "{err}"),
            Self::StaleImport {
                prepared_at,
                current,
            } => write!(
                f,
                "import was prepared at revision {prepared_at} but notes are at {current}"
            ),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Transfer(err) => Some(err),
            Self::StaleImport { .. } => None,
        }
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<TransferError> for SessionError {
    fn from(value: TransferError) -> Self {
        Self::Transfer(value)
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// What a `save` command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(Note),
    Updated(Note),
}

impl SaveOutcome {
    pub fn note(&self) -> &Note {
        match self {
            Self::Created(note) | Self::Updated(note) => note,
        }
    }
}

/// Validated import awaiting user confirmation.
///
/// Dropping it without calling [`NoteSession::commit_import`] cancels the
/// import.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a pending import does nothing until committed"]
pub struct PendingImport {
    merged: Vec<Note>,
    added_count: usize,
    base_revision: u64,
}

impl PendingImport {
    /// Notes that would be added on commit.
    pub fn added_count(&self) -> usize {
        self.added_count
    }

    /// Full collection that would be installed on commit.
    pub fn merged(&self) -> &[Note] {
        &self.merged
    }
}

/// Editor-side state: which note is open and the star toggle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorState {
    pub editing: Option<NoteId>,
    pub important_mode: bool,
}

/// One user session over a note repository.
pub struct NoteSession<S: KvStore> {
    repo: NoteRepository<S>,
    clock: Box<dyn Clock + Send>,
    editor: EditorState,
    filter: ViewFilter,
}

impl<S: KvStore> NoteSession<S> {
    /// Loads notes from `store` and starts with a blank editor and no filter.
    pub fn open<C>(store: S, clock: C) -> SessionResult<Self>
    where
        C: Clock + Clone + Send + 'static,
    {
        let repo = NoteRepository::load(store, clock.clone())?;
        Ok(Self::with_repository(repo, clock))
    }

    /// Wraps an already-loaded repository.
    pub fn with_repository(repo: NoteRepository<S>, clock: impl Clock + Send + 'static) -> Self {
        Self {
            repo,
            clock: Box::new(clock),
            editor: EditorState::default(),
            filter: ViewFilter::default(),
        }
    }

    pub fn repository(&self) -> &NoteRepository<S> {
        &self.repo
    }

    pub fn editor(&self) -> EditorState {
        self.editor
    }

    pub fn filter(&self) -> &ViewFilter {
        &self.filter
    }

    /// Clears the editor: nothing open, star toggle off.
    pub fn new_note(&mut self) {
        self.editor = EditorState::default();
    }

    /// Flips the star toggle for the note being written; returns the new value.
    pub fn toggle_important_mode(&mut self) -> bool {
        self.editor.important_mode = !self.editor.important_mode;
        self.editor.important_mode
    }

    pub fn set_important_mode(&mut self, important: bool) {
        self.editor.important_mode = important;
    }

    /// Opens a note for editing; returns `None` and changes nothing if missing.
    pub fn open_detail(&mut self, id: NoteId) -> Option<&Note> {
        let note = self.repo.find_by_id(id)?;
        self.editor = EditorState {
            editing: Some(id),
            important_mode: note.is_important,
        };
        Some(note)
    }

    /// Saves editor content as a new note or as an edit of the open note.
    ///
    /// # Errors
    /// - Validation failure for blank content (editor state kept).
    /// - Not-found when the open note was removed meanwhile.
    pub fn save(&mut self, content: &str) -> SessionResult<SaveOutcome> {
        let important = self.editor.important_mode;
        let outcome = match self.editor.editing {
            Some(id) => SaveOutcome::Updated(self.repo.update(id, content, important)?),
            None => SaveOutcome::Created(self.repo.create(content, important)?),
        };
        self.new_note();
        Ok(outcome)
    }

    /// Deletes a note; closes the editor if it was showing that note.
    ///
    /// Returns `false` when no note had that id.
    pub fn delete(&mut self, id: NoteId) -> SessionResult<bool> {
        let removed = self.repo.delete(id)?;
        if removed && self.editor.editing == Some(id) {
            self.new_note();
        }
        Ok(removed)
    }

    /// Replaces the search term used by the list view.
    pub fn search(&mut self, term: impl Into<String>) {
        self.filter.search_term = term.into();
    }

    /// Flips the "important only" list filter; returns the new value.
    pub fn toggle_filter(&mut self) -> bool {
        self.filter.important_only = !self.filter.important_only;
        self.filter.important_only
    }

    /// Current list view under the active filter.
    pub fn view(&self) -> ListView<'_> {
        ListView::build(self.repo.notes(), &self.filter)
    }

    /// Message for an empty list under the active filter.
    pub fn empty_message(&self) -> &'static str {
        empty_message(&self.filter)
    }

    /// Full collection as a backup document, ignoring the active filter.
    pub fn export(&self) -> SessionResult<String> {
        Ok(export_document(self.repo.notes())?)
    }

    /// Writes a timestamped backup file into `dir`.
    pub fn export_to_dir(&self, dir: impl AsRef<Path>) -> SessionResult<PathBuf> {
        let now = self.clock.now_millis();
        Ok(write_export_file(dir, self.repo.notes(), now)?)
    }

    /// Validates and merges `payload` without touching the repository.
    pub fn prepare_import(&self, payload: &Value) -> SessionResult<PendingImport> {
        let outcome = match merge(self.repo.notes(), payload) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    "event=import_prepare module=service status=error error={}",
                    err
                );
                return Err(err.into());
            }
        };
        Ok(PendingImport {
            merged: outcome.merged,
            added_count: outcome.added_count,
            base_revision: self.repo.revision(),
        })
    }

    /// Reads a `.json` backup from disk and prepares it for import.
    pub fn prepare_import_file(&self, path: impl AsRef<Path>) -> SessionResult<PendingImport> {
        let payload = read_import_file(path)?;
        self.prepare_import(&payload)
    }

    /// Installs a confirmed import and returns the number of notes added.
    ///
    /// # Errors
    /// - [`SessionError::StaleImport`] if notes changed since preparation.
    pub fn commit_import(&mut self, pending: PendingImport) -> SessionResult<usize> {
        let current = self.repo.revision();
        if pending.base_revision != current {
            return Err(SessionError::StaleImport {
                prepared_at: pending.base_revision,
                current,
            });
        }
        let added = pending.added_count;
        self.repo.apply_import(pending.merged)?;
        info!(
            "event=import_commit module=service status=ok added={}",
            added
        );
        Ok(added)
    }
}
