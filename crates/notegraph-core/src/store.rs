//! GraphStore: the single mutable owner of the loaded graph and its
//! derived indexes.
//!
//! Indexes are rebuilt wholesale after every successful load or mutation,
//! never patched incrementally. The rebuild is O(notes + edges) and runs to
//! completion before any read, so partial index state is never observable.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;
use crate::model::{Graph, LinkEntry, LongRangeEntry, Note};

// ============================================================================
// DERIVED INDEXES
// ============================================================================

/// Index structures derived from the current graph.
///
/// Owned exclusively by [`GraphStore`]; a mutation invalidates the whole set
/// and the store rebuilds it before handing out another read.
#[derive(Debug, Clone, Default)]
pub struct Indexes {
    /// note_id → array position. On duplicate ids the last occurrence wins;
    /// the validator independently flags the duplication as an error.
    pub by_id: HashMap<i64, usize>,

    /// Inbound edges: target → (source → score), deterministically ordered.
    pub reverse_related: HashMap<i64, BTreeMap<i64, f64>>,

    /// Long-range adjacency: note → (other, score), descending score.
    pub long_range_adj: HashMap<i64, Vec<(i64, f64)>>,

    /// All valid long-range triples, descending score, ties by ascending
    /// endpoint pair. Backs global top-K reads.
    pub long_range_sorted: Vec<(i64, i64, f64)>,

    /// note_id → cluster id, for notes covered by `cluster_labels`.
    pub cluster_of: HashMap<i64, i64>,

    /// cluster id → member count.
    pub cluster_counts: BTreeMap<i64, usize>,

    /// Dangling `(source, target)` related references discovered while
    /// indexing, in note order. Surfaced by the validator as warnings; the
    /// entries themselves stay in the owning note until the user edits it.
    pub dangling_related: Vec<(i64, i64)>,
}

/// Aggregate counts for a loaded graph.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GraphStats {
    pub notes: usize,
    pub related_links: usize,
    pub malformed_links: usize,
    pub long_range_links: usize,
    pub clusters: usize,
    pub dangling_related: usize,
}

// ============================================================================
// GRAPH STORE
// ============================================================================

/// Owner of the loaded [`Graph`] and its [`Indexes`].
#[derive(Debug, Default)]
pub struct GraphStore {
    graph: Graph,
    indexes: Indexes,
}

impl GraphStore {
    /// Empty store. A subsequent [`GraphStore::load`] installs a graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a snapshot document into a fresh store.
    pub fn from_value(document: Value) -> Result<Self, ParseError> {
        Ok(Self::from_graph(Graph::from_value(document)?))
    }

    /// Wrap an already-parsed graph.
    pub fn from_graph(graph: Graph) -> Self {
        let mut store = Self {
            graph,
            indexes: Indexes::default(),
        };
        store.build_indexes();
        store
    }

    /// Replace the current graph with a newly parsed document.
    ///
    /// On parse failure the previous graph and indexes are retained
    /// untouched.
    pub fn load(&mut self, document: Value) -> Result<(), ParseError> {
        let graph = Graph::from_value(document)?;
        self.graph = graph;
        self.build_indexes();
        Ok(())
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable graph access for the mutation engine. Callers must rebuild
    /// indexes before the next read.
    pub(crate) fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn indexes(&self) -> &Indexes {
        &self.indexes
    }

    /// Note lookup through `by_id`.
    pub fn note(&self, id: i64) -> Option<&Note> {
        self.indexes
            .by_id
            .get(&id)
            .and_then(|&position| self.graph.notes.get(position))
    }

    /// Array position of a note id, when indexed.
    pub fn note_position(&self, id: i64) -> Option<usize> {
        self.indexes.by_id.get(&id).copied()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.indexes.by_id.contains_key(&id)
    }

    /// Derive all index structures from the current graph.
    ///
    /// Runs after every successful load or mutation, before any read.
    pub fn build_indexes(&mut self) {
        let graph = &self.graph;
        let mut indexes = Indexes::default();

        for (position, note) in graph.notes.iter().enumerate() {
            if let Some(id) = note.id() {
                indexes.by_id.insert(id, position);
            }
        }

        for note in &graph.notes {
            let Some(source) = note.id() else { continue };
            for (target, score) in note.related_links() {
                if indexes.by_id.contains_key(&target) {
                    indexes
                        .reverse_related
                        .entry(target)
                        .or_default()
                        .insert(source, score);
                } else {
                    indexes.dangling_related.push((source, target));
                }
            }
        }

        if graph.cluster_labels.is_some() {
            for (position, note) in graph.notes.iter().enumerate() {
                let Some(id) = note.id() else { continue };
                if indexes.by_id.get(&id) != Some(&position) {
                    continue;
                }
                let Some(cluster) = graph.cluster_label_at(position) else {
                    continue;
                };
                indexes.cluster_of.insert(id, cluster);
                *indexes.cluster_counts.entry(cluster).or_insert(0) += 1;
            }
        }

        for (a, b, score) in graph.long_range_triples() {
            // Dangling long-range entries are skipped without a warning;
            // only dangling related links warn.
            if !indexes.by_id.contains_key(&a) || !indexes.by_id.contains_key(&b) {
                continue;
            }
            indexes.long_range_adj.entry(a).or_default().push((b, score));
            indexes.long_range_adj.entry(b).or_default().push((a, score));
            indexes.long_range_sorted.push((a, b, score));
        }
        for adjacent in indexes.long_range_adj.values_mut() {
            adjacent.sort_by(|x, y| {
                y.1.partial_cmp(&x.1)
                    .unwrap_or(Ordering::Equal)
                    .then(x.0.cmp(&y.0))
            });
        }
        indexes.long_range_sorted.sort_by(|x, y| {
            y.2.partial_cmp(&x.2)
                .unwrap_or(Ordering::Equal)
                .then(x.0.cmp(&y.0))
                .then(x.1.cmp(&y.1))
        });

        debug!(
            notes = graph.notes.len(),
            indexed = indexes.by_id.len(),
            long_range = indexes.long_range_sorted.len(),
            clusters = indexes.cluster_counts.len(),
            dangling = indexes.dangling_related.len(),
            "rebuilt graph indexes"
        );

        self.indexes = indexes;
    }

    /// Aggregate counts over the current graph.
    pub fn stats(&self) -> GraphStats {
        let mut related_links = 0;
        let mut malformed_links = 0;
        for note in &self.graph.notes {
            for entry in &note.related_note_links {
                match entry {
                    LinkEntry::Link(..) => related_links += 1,
                    LinkEntry::Malformed(_) => malformed_links += 1,
                }
            }
        }
        let long_range_links = self
            .graph
            .long_range_links
            .iter()
            .flatten()
            .filter(|entry| matches!(entry, LongRangeEntry::Link(..)))
            .count();

        GraphStats {
            notes: self.graph.notes.len(),
            related_links,
            malformed_links,
            long_range_links,
            clusters: self.indexes.cluster_counts.len(),
            dangling_related: self.indexes.dangling_related.len(),
        }
    }
}
