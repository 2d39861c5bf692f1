//! Core use-case services.
//!
//! # Responsibility
//! - Turn UI actions into repository, projection and reconciler calls.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod note_service;
