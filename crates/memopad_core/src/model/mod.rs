//! Note domain model and its id/timestamp source.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Hand out monotonic note ids and modification stamps.
//!
//! # Invariants
//! - Every note is identified by a unique `NoteId`.
//! - Ids issued by one `IdSource` are strictly increasing.

pub mod clock;
pub mod note;
