//! List-view projection over the note sequence.
//!
//! # Responsibility
//! - Narrow the repository sequence by importance flag and search term.
//! - Classify empty outcomes for user-facing messaging.
//! - Format note timestamps for list headers.
//!
//! # Invariants
//! - Projection is pure and order-preserving; it never re-sorts.
//! - Both predicates are conjunctive.
//! - `project(notes, "", false)` returns every note.

use crate::model::note::Note;
use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// UI-side predicates applied to the note list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFilter {
    /// Raw search input; trimmed and case-folded before matching.
    pub search_term: String,
    /// When set, only starred notes are shown.
    pub important_only: bool,
}

impl ViewFilter {
    pub fn new(search_term: impl Into<String>, important_only: bool) -> Self {
        Self {
            search_term: search_term.into(),
            important_only,
        }
    }

    /// Applies this filter to `notes`.
    pub fn apply<'a>(&self, notes: &'a [Note]) -> Vec<&'a Note> {
        project(notes, &self.search_term, self.important_only)
    }
}

/// Derives the displayed subsequence of `notes`.
pub fn project<'a>(notes: &'a [Note], search_term: &str, important_only: bool) -> Vec<&'a Note> {
    let needle = search_term.trim().to_lowercase();
    notes
        .iter()
        .filter(|note| !important_only || note.is_important)
        .filter(|note| needle.is_empty() || note.content.to_lowercase().contains(&needle))
        .collect()
}

/// Projection outcome distinguishing the two empty states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView<'a> {
    /// At least one note survived the filter.
    Items(Vec<&'a Note>),
    /// Repository holds no notes at all.
    NoNotes,
    /// Notes exist but none matched the filter.
    NoMatches,
}

impl<'a> ListView<'a> {
    /// Projects `notes` and classifies the result.
    pub fn build(notes: &'a [Note], filter: &ViewFilter) -> Self {
        if notes.is_empty() {
            return Self::NoNotes;
        }
        let items = filter.apply(notes);
        if items.is_empty() {
            Self::NoMatches
        } else {
            Self::Items(items)
        }
    }

    /// Visible notes; empty for both empty states.
    pub fn items(&self) -> &[&'a Note] {
        match self {
            Self::Items(items) => items,
            Self::NoNotes | Self::NoMatches => &[],
        }
    }
}

/// Placeholder text shown when the projected list is empty.
pub fn empty_message(filter: &ViewFilter) -> &'static str {
    if filter.important_only {
        "No important notes."
    } else {
        "No notes saved yet."
    }
}

/// Formats epoch milliseconds as `YYYY-MM-DD HH:MM` in local time.
pub fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(local) => local.format(TIMESTAMP_FORMAT).to_string(),
        None => format_timestamp_utc(millis),
    }
}

/// Formats epoch milliseconds with an explicit UTC offset (in seconds).
///
/// Falls back to UTC for offsets outside +/-24h.
pub fn format_timestamp_with_offset(millis: i64, offset_seconds: i32) -> String {
    let Some(offset) = FixedOffset::east_opt(offset_seconds) else {
        return format_timestamp_utc(millis);
    };
    match offset.timestamp_millis_opt(millis).single() {
        Some(at) => at.format(TIMESTAMP_FORMAT).to_string(),
        None => millis.to_string(),
    }
}

fn format_timestamp_utc(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|at| at.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| millis.to_string())
}

#[cfg(test)]
mod tests {
    use super::{
        empty_message, format_timestamp_with_offset, project, ListView, ViewFilter,
    };
    use crate::model::note::Note;

    fn note(id: i64, content: &str, important: bool) -> Note {
        Note::new(id, content, important).unwrap()
    }

    fn sample() -> Vec<Note> {
        vec![
            note(3, "Buy MILK and eggs", true),
            note(2, "call mom", false),
            note(1, "milkshake recipe", false),
        ]
    }

    #[test]
    fn empty_predicates_return_everything_in_order() {
        let notes = sample();
        let projected = project(&notes, "", false);
        let ids: Vec<_> = projected.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn search_is_trimmed_case_insensitive_substring() {
        let notes = sample();
        let ids: Vec<_> = project(&notes, "  Milk ", false)
            .iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn filters_are_conjunctive() {
        let notes = sample();
        let ids: Vec<_> = project(&notes, "milk", true).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![3]);
        assert!(project(&notes, "mom", true).is_empty());
    }

    #[test]
    fn whitespace_search_term_is_ignored() {
        let notes = sample();
        assert_eq!(project(&notes, " \t ", false).len(), 3);
    }

    #[test]
    fn list_view_distinguishes_empty_states() {
        let filter = ViewFilter::new("zzz", false);
        assert_eq!(ListView::build(&[], &filter), ListView::NoNotes);

        let notes = sample();
        let view = ListView::build(&notes, &filter);
        assert_eq!(view, ListView::NoMatches);
        assert!(view.items().is_empty());

        let view = ListView::build(&notes, &ViewFilter::new("call", false));
        assert_eq!(view.items().len(), 1);
    }

    #[test]
    fn empty_message_follows_importance_filter() {
        assert_eq!(
            empty_message(&ViewFilter::new("", true)),
            "No important notes."
        );
        assert_eq!(
            empty_message(&ViewFilter::default()),
            "No notes saved yet."
        );
    }

    #[test]
    fn timestamp_formats_minutes_with_offset() {
        // 2024-03-05T07:08:09Z
        let millis = 1_709_622_489_000;
        assert_eq!(format_timestamp_with_offset(millis, 0), "2024-03-05 07:08");
        assert_eq!(
            format_timestamp_with_offset(millis, 9 * 3600),
            "2024-03-05 16:08"
        );
    }
}
