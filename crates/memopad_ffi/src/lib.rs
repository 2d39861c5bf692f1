//! Flutter-facing bridge over `memopad_core`.

pub mod api;
