//! Mutation engine: the only write path into a loaded graph.
//!
//! Every mutation completes, including the wholesale index rebuild,
//! before control returns, so subsequent reads always observe consistent
//! state. Deletion is positional to preserve `cluster_labels` alignment;
//! surviving note ids are never renumbered.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::model::{LinkEntry, LongRangeEntry};
use crate::session::Session;
use crate::store::GraphStore;
use crate::validate::ValidationIssue;

/// Caller-supplied note edit. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct NoteEdit {
    pub raw_content: Option<String>,
    pub context: Option<String>,
    /// Replacement for `related_note_links`, as `"id:score"` tokens
    /// delimited by commas, spaces, or newlines. A bare `id` implies score
    /// 0; unparseable tokens are dropped silently.
    pub related_links_text: Option<String>,
}

/// Applies edits and deletions to a [`GraphStore`], keeping the session in
/// step and rebuilding indexes after every change.
#[derive(Debug)]
pub struct MutationEngine<'a> {
    store: &'a mut GraphStore,
    session: &'a mut Session,
}

impl<'a> MutationEngine<'a> {
    pub fn new(store: &'a mut GraphStore, session: &'a mut Session) -> Self {
        Self { store, session }
    }

    /// Update a note's text fields and/or replace its related links.
    ///
    /// Unknown target ids in the replacement list are dropped, recorded as
    /// one warning naming all of them. Unknown `id` is a no-op.
    pub fn edit_note(&mut self, id: i64, edit: NoteEdit) -> Vec<ValidationIssue> {
        let mut warnings = Vec::new();
        let Some(position) = self.store.note_position(id) else {
            return warnings;
        };

        let replacement = edit.related_links_text.as_deref().map(|text| {
            let mut kept = Vec::new();
            let mut dropped = Vec::new();
            for (target, score) in parse_related_links_text(text) {
                if self.store.contains(target) {
                    kept.push(LinkEntry::Link(target, score));
                } else {
                    dropped.push(target);
                }
            }
            if !dropped.is_empty() {
                warn!(note = id, ?dropped, "dropping unknown related-link targets");
                warnings.push(ValidationIssue::UnknownTargetsDropped {
                    source: id,
                    dropped,
                });
            }
            kept
        });

        let graph = self.store.graph_mut();
        if let Some(note) = graph.notes.get_mut(position) {
            if let Some(raw_content) = edit.raw_content {
                note.raw_content = raw_content;
            }
            if let Some(context) = edit.context {
                note.context = context;
            }
            if let Some(links) = replacement {
                note.related_note_links = links;
            }
        }

        self.session.dirty = true;
        self.store.build_indexes();
        info!(note = id, "edited note");
        warnings
    }

    /// Delete a note and every reference to it.
    ///
    /// Returns `false` (and changes nothing) when `id` is unknown. The
    /// aligned `cluster_labels` entry is removed at the same position; the
    /// new current note is the one now at `min(old_index, new_len - 1)`.
    pub fn delete_note(&mut self, id: i64) -> bool {
        let Some(position) = self.store.note_position(id) else {
            return false;
        };

        let graph = self.store.graph_mut();
        graph.notes.remove(position);
        if let Some(labels) = graph.cluster_labels.as_mut() {
            if position < labels.len() {
                labels.remove(position);
            }
        }

        for note in &mut graph.notes {
            note.related_note_links
                .retain(|entry| !matches!(entry, LinkEntry::Link(target, _) if *target == id));
        }
        if let Some(entries) = graph.long_range_links.as_mut() {
            entries.retain(
                |entry| !matches!(entry, LongRangeEntry::Link(a, b, _) if *a == id || *b == id),
            );
        }

        self.session.current_note = if graph.notes.is_empty() {
            None
        } else {
            let next = position.min(graph.notes.len() - 1);
            graph.notes[next].id()
        };

        self.session.dirty = true;
        self.store.build_indexes();
        info!(note = id, "deleted note");
        true
    }
}

/// Parse `"id:score"` tokens into an ordered, deduplicated link list.
///
/// Duplicated targets keep the maximum score; order is first occurrence.
pub fn parse_related_links_text(text: &str) -> Vec<(i64, f64)> {
    let mut links: Vec<(i64, f64)> = Vec::new();
    let mut slots: HashMap<i64, usize> = HashMap::new();

    for token in text.split(|c: char| c == ',' || c.is_whitespace()) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (id_part, score_part) = match token.split_once(':') {
            Some((id_part, score_part)) => (id_part, Some(score_part)),
            None => (token, None),
        };
        let Ok(target) = id_part.trim().parse::<i64>() else {
            continue;
        };
        let score = match score_part {
            None => 0.0,
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(score) => score,
                Err(_) => continue,
            },
        };

        match slots.get(&target) {
            Some(&slot) => {
                if score > links[slot].1 {
                    links[slot].1 = score;
                }
            }
            None => {
                slots.insert(target, links.len());
                links.push((target, score));
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Graph;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store_from(doc: serde_json::Value) -> GraphStore {
        GraphStore::from_value(doc).unwrap()
    }

    #[test]
    fn parse_tokens_dedupes_by_max_score() {
        assert_eq!(
            parse_related_links_text("5:0.9, 5:0.3, 7, junk, 9:x, 8:0.2"),
            vec![(5, 0.9), (7, 0.0), (8, 0.2)]
        );
        assert_eq!(parse_related_links_text("3:0.1\n3:0.8 3:0.5"), vec![(3, 0.8)]);
        assert_eq!(parse_related_links_text(""), vec![]);
    }

    #[test]
    fn edit_replaces_links_and_warns_once_about_dropped_ids() {
        let mut store = store_from(json!({
            "notes": [{"note_id": 1}, {"note_id": 5}]
        }));
        let mut session = Session::new();

        let warnings = MutationEngine::new(&mut store, &mut session)
            .edit_note(1, NoteEdit {
                related_links_text: Some("5:0.9, 5:0.3, 999:0.1".to_string()),
                ..NoteEdit::default()
            });

        assert_eq!(
            store.note(1).unwrap().related_note_links,
            vec![LinkEntry::Link(5, 0.9)]
        );
        assert_eq!(
            warnings,
            vec![ValidationIssue::UnknownTargetsDropped { source: 1, dropped: vec![999] }]
        );
        assert!(session.dirty);
        // Index reflects the rewrite immediately.
        assert_eq!(store.indexes().reverse_related[&5][&1], 0.9);
    }

    #[test]
    fn edit_text_fields_only_leaves_links_alone() {
        let mut store = store_from(json!({
            "notes": [{"note_id": 1, "related_note_links": [[2, 0.5]]}, {"note_id": 2}]
        }));
        let mut session = Session::new();

        let warnings = MutationEngine::new(&mut store, &mut session).edit_note(1, NoteEdit {
            raw_content: Some("new text".to_string()),
            context: Some("new ctx".to_string()),
            ..NoteEdit::default()
        });

        assert!(warnings.is_empty());
        let note = store.note(1).unwrap();
        assert_eq!(note.raw_content, "new text");
        assert_eq!(note.context, "new ctx");
        assert_eq!(note.related_note_links, vec![LinkEntry::Link(2, 0.5)]);
    }

    #[test]
    fn edit_unknown_note_is_a_noop() {
        let mut store = store_from(json!({"notes": [{"note_id": 1}]}));
        let mut session = Session::new();
        let warnings =
            MutationEngine::new(&mut store, &mut session).edit_note(42, NoteEdit::default());
        assert!(warnings.is_empty());
        assert!(!session.dirty);
    }

    #[test]
    fn delete_strips_every_reference() {
        let mut store = store_from(json!({
            "notes": [
                {"note_id": 1, "related_note_links": [[2, 0.5], [3, 0.4]]},
                {"note_id": 2, "related_note_links": [[1, 0.9]]},
                {"note_id": 3, "related_note_links": [[2, 0.1]]}
            ],
            "long_range_links": [[1, 2, 0.3], [1, 3, 0.7], [2, 3, 0.2]]
        }));
        let mut session = Session::with_selection(2);

        assert!(MutationEngine::new(&mut store, &mut session).delete_note(2));

        let graph = store.graph();
        assert_eq!(graph.notes.len(), 2);
        let no_refs = graph.notes.iter().all(|note| {
            note.related_links().all(|(target, _)| target != 2)
        });
        assert!(no_refs);
        assert_eq!(
            graph.long_range_triples().collect::<Vec<_>>(),
            vec![(1, 3, 0.7)]
        );
        assert!(!store.contains(2));
    }

    #[test]
    fn delete_removes_aligned_cluster_label_only() {
        let mut store = store_from(json!({
            "notes": [{"note_id": 10}, {"note_id": 11}, {"note_id": 12}],
            "cluster_labels": [7, 8, 9]
        }));
        let mut session = Session::new();

        MutationEngine::new(&mut store, &mut session).delete_note(11);

        let labels = store.graph().cluster_labels.as_ref().unwrap();
        assert_eq!(labels, &vec![json!(7), json!(9)]);
        assert_eq!(store.indexes().cluster_of[&10], 7);
        assert_eq!(store.indexes().cluster_of[&12], 9);
    }

    #[test]
    fn delete_selects_note_at_same_position_or_last() {
        let mut store = store_from(json!({
            "notes": [{"note_id": 1}, {"note_id": 2}, {"note_id": 3}]
        }));
        let mut session = Session::new();

        // Deleting in the middle selects the note that slid into position 1.
        MutationEngine::new(&mut store, &mut session).delete_note(2);
        assert_eq!(session.current_note, Some(3));

        // Deleting the tail clamps to the new last position.
        MutationEngine::new(&mut store, &mut session).delete_note(3);
        assert_eq!(session.current_note, Some(1));

        MutationEngine::new(&mut store, &mut session).delete_note(1);
        assert_eq!(session.current_note, None);
    }

    #[test]
    fn delete_unknown_note_is_a_noop() {
        let mut store = store_from(json!({"notes": [{"note_id": 1}]}));
        let mut session = Session::new();
        assert!(!MutationEngine::new(&mut store, &mut session).delete_note(9));
        assert_eq!(store.graph().notes.len(), 1);
        assert!(!session.dirty);
    }

    #[test]
    fn deleted_graph_round_trips_cleanly() {
        let mut store = store_from(json!({
            "notes": [{"note_id": 1}, {"note_id": 2}],
            "cluster_labels": [0, 1]
        }));
        let mut session = Session::new();
        MutationEngine::new(&mut store, &mut session).delete_note(1);

        let out = serde_json::to_value(store.graph()).unwrap();
        let reparsed = Graph::from_value(out).unwrap();
        assert_eq!(reparsed.notes.len(), 1);
        assert_eq!(reparsed.cluster_label_at(0), Some(1));
    }
}
