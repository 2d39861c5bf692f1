//! Ordered in-memory note repository synchronized with a `KvStore`.
//!
//! # Responsibility
//! - Own the note sequence for one session and every mutation on it.
//! - Persist the whole sequence after each successful mutation.
//!
//! # Invariants
//! - Note ids are unique at all times.
//! - New notes are prepended; updates keep the note's position.
//! - Sequence order is persisted verbatim (no implicit sort).
//! - A mutation is committed to memory only after the store accepted it, so
//!   any failure leaves the repository unchanged.

use crate::model::clock::{Clock, IdSource};
use crate::model::note::{normalize_content, Note, NoteId, NoteValidationError};
use crate::store::{load_document, save_document, KvStore, StoreError};
use log::{debug, error, info};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store key holding the serialized note collection.
pub const DEFAULT_NOTES_KEY: &str = "memos";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note mutations and store synchronization.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    NotFound(NoteId),
    /// Two notes in one collection share an id.
    DuplicateId(NoteId),
    /// The id source reached `i64::MAX`; no unique id is left to issue.
    IdsExhausted,
    Store(StoreError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::DuplicateId(id) => write!(f, "duplicate note id: {id}"),
            Self::IdsExhausted => write!(f, "no note ids left above the newest stored one"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateId(_) | Self::IdsExhausted => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Session-owned note collection.
#[derive(Debug)]
pub struct NoteRepository<S: KvStore> {
    store: S,
    key: String,
    notes: Vec<Note>,
    ids: IdSource,
    revision: u64,
}

impl<S: KvStore> NoteRepository<S> {
    /// Loads the collection stored under [`DEFAULT_NOTES_KEY`].
    pub fn load(store: S, clock: impl Clock + Send + 'static) -> RepoResult<Self> {
        Self::with_key(store, DEFAULT_NOTES_KEY, clock)
    }

    /// Loads the collection stored under a caller-chosen key.
    ///
    /// A missing key yields an empty repository.
    ///
    /// # Errors
    /// - [`RepoError::Store`] when the store is unreadable or the stored
    ///   document is corrupt. Stored records are not re-validated.
    pub fn with_key(
        store: S,
        key: impl Into<String>,
        clock: impl Clock + Send + 'static,
    ) -> RepoResult<Self> {
        let key = key.into();
        let notes: Vec<Note> = match load_document(&store, &key) {
            Ok(loaded) => loaded.unwrap_or_default(),
            Err(err) => {
                error!(
                    "event=notes_load module=repo status=error key={} error={}",
                    key, err
                );
                return Err(err.into());
            }
        };

        let mut ids = IdSource::new(clock);
        observe_all(&mut ids, &notes);
        info!(
            "event=notes_load module=repo status=ok key={} count={}",
            key,
            notes.len()
        );

        Ok(Self {
            store,
            key,
            notes,
            ids,
            revision: 0,
        })
    }

    /// Current notes in display order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Counter bumped by every committed mutation.
    ///
    /// Lets callers detect that a precomputed result went stale.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Looks up one note without side effects.
    pub fn find_by_id(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// Creates a note at the head of the sequence.
    ///
    /// # Errors
    /// - [`RepoError::Validation`] for blank content.
    /// - [`RepoError::IdsExhausted`] when no id above the stored ones is left.
    /// - [`RepoError::Store`] when persisting fails.
    pub fn create(&mut self, content: &str, is_important: bool) -> RepoResult<Note> {
        // Validate before consuming an id so rejected input leaves no trace.
        normalize_content(content)?;
        let id = self.ids.next_id().ok_or(RepoError::IdsExhausted)?;
        let note = Note::new(id, content, is_important)?;

        let mut candidate = Vec::with_capacity(self.notes.len() + 1);
        candidate.push(note.clone());
        candidate.extend(self.notes.iter().cloned());
        self.commit("note_create", candidate)?;

        info!(
            "event=note_create module=repo status=ok id={} important={}",
            note.id, note.is_important
        );
        Ok(note)
    }

    /// Replaces content and importance of an existing note in place.
    ///
    /// # Errors
    /// - [`RepoError::NotFound`] when `id` is unknown.
    /// - [`RepoError::Validation`] for blank content.
    /// - [`RepoError::IdsExhausted`] when no timestamp above the stored ones is left.
    /// - [`RepoError::Store`] when persisting fails.
    pub fn update(&mut self, id: NoteId, content: &str, is_important: bool) -> RepoResult<Note> {
        let Some(index) = self.position(id) else {
            return Err(RepoError::NotFound(id));
        };
        normalize_content(content)?;

        let stamp = self.ids.next_stamp().ok_or(RepoError::IdsExhausted)?;
        let mut candidate = self.notes.clone();
        candidate[index].revise(content, is_important, stamp)?;
        let updated = candidate[index].clone();
        self.commit("note_update", candidate)?;

        info!(
            "event=note_update module=repo status=ok id={} index={} important={}",
            id, index, is_important
        );
        Ok(updated)
    }

    /// Removes a note; returns `false` when `id` did not exist.
    ///
    /// Deleting a missing id is a tolerated no-op and does not touch the store.
    pub fn delete(&mut self, id: NoteId) -> RepoResult<bool> {
        let Some(index) = self.position(id) else {
            debug!("event=note_delete module=repo status=noop id={}", id);
            return Ok(false);
        };

        let mut candidate = self.notes.clone();
        candidate.remove(index);
        self.commit("note_delete", candidate)?;

        info!("event=note_delete module=repo status=ok id={}", id);
        Ok(true)
    }

    /// Installs a reconciled collection produced by the import merge.
    ///
    /// # Errors
    /// - [`RepoError::Validation`] if any note has blank content.
    /// - [`RepoError::DuplicateId`] if two notes share an id.
    /// - [`RepoError::Store`] when persisting fails.
    pub fn apply_import(&mut self, merged: Vec<Note>) -> RepoResult<()> {
        let mut seen = HashSet::with_capacity(merged.len());
        for note in &merged {
            note.validate()?;
            if !seen.insert(note.id) {
                error!(
                    "event=notes_import module=repo status=error reason=duplicate_id id={}",
                    note.id
                );
                return Err(RepoError::DuplicateId(note.id));
            }
        }
        self.commit("notes_import", merged)?;
        observe_all(&mut self.ids, &self.notes);
        Ok(())
    }

    /// Borrows the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the backing store, e.g. to inject failures in tests.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn position(&self, id: NoteId) -> Option<usize> {
        self.notes.iter().position(|note| note.id == id)
    }

    fn commit(&mut self, event: &'static str, candidate: Vec<Note>) -> RepoResult<()> {
        if let Err(err) = save_document(&mut self.store, &self.key, &candidate) {
            error!(
                "event={} module=repo status=error key={} error={}",
                event, self.key, err
            );
            return Err(err.into());
        }
        self.notes = candidate;
        self.revision += 1;
        Ok(())
    }
}

fn observe_all(ids: &mut IdSource, notes: &[Note]) {
    for note in notes {
        ids.observe(note.id.max(note.last_modified));
    }
}
