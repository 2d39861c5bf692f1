//! Read-side projections of the note list.
//!
//! # Responsibility
//! - Derive the displayed subsequence from repository state + UI state.
//! - Keep result shaping (empty states, timestamp labels) inside core.

pub mod projection;
