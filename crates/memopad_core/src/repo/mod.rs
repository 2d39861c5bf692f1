//! Note repository: the session-owned, store-synchronized note sequence.
//!
//! # Responsibility
//! - Own create/update/delete/import mutations and their invariants.
//! - Keep the JSON document in the `KvStore` in sync with memory.
//!
//! # Invariants
//! - Every write path validates content before touching the store.
//! - Repository APIs return semantic errors (`NotFound`, `Validation`) in
//!   addition to store transport errors.

pub mod note_repo;
