//! Explicit session state for a hosting application.
//!
//! Wraps the selection and dirty tracking that would otherwise creep into
//! the store as globals. The store, validator, and scene builders stay free
//! of it and remain independently testable.

/// Mutable per-session context owned by the hosting process.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Currently selected note, if any.
    pub current_note: Option<i64>,

    /// Whether the graph has unsaved changes.
    pub dirty: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session with an initial selection.
    pub fn with_selection(note_id: i64) -> Self {
        Self {
            current_note: Some(note_id),
            dirty: false,
        }
    }
}
