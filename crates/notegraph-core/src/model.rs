//! Snapshot data contracts for the semantic note graph.
//!
//! These are DATA CONTRACTS only - no indexes, no behavior beyond accessors.
//!
//! ## Design Principles
//!
//! 1. **Lenient fields** - a note with a missing id or a misshapen link
//!    entry still loads; the validator turns it into a diagnostic. Only a
//!    non-object root or a non-sequence `notes` aborts parsing.
//! 2. **Opaque passthrough** - embeddings, centroids, and provenance are
//!    externally produced; they are carried as raw `serde_json::Value` and
//!    never interpreted.
//! 3. **Round-trip fidelity** - unknown fields are captured via
//!    `#[serde(flatten)]` into a `BTreeMap` and re-serialized verbatim.
//! 4. **Positional alignment** - `notes` order is semantically significant:
//!    it is the alignment key for `cluster_labels`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseError;

// ============================================================================
// LINK ENTRIES
// ============================================================================

/// One entry of a note's `related_note_links` sequence.
///
/// Well-formed entries are `[target_note_id, score]` pairs. Anything else is
/// preserved in place as `Malformed` so the validator can report it and a
/// save (if ever permitted) would not silently rewrite the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkEntry {
    /// Directed scored edge: `(target_note_id, score)`.
    Link(i64, f64),
    /// Anything not shaped as `(integer, number)`.
    Malformed(Value),
}

/// One entry of the top-level `long_range_links` sequence.
///
/// Well-formed entries are undirected `[note_id_a, note_id_b, score]`
/// triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LongRangeEntry {
    /// Undirected scored edge: `(note_id_a, note_id_b, score)`.
    Link(i64, i64, f64),
    /// Anything not shaped as `(integer, integer, number)`.
    Malformed(Value),
}

// ============================================================================
// NOTE
// ============================================================================

/// One semantic fragment of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Note {
    /// Unique integer key within the graph. `None` when the document is
    /// missing the field or carries a non-integer; the validator flags it.
    #[serde(
        default,
        deserialize_with = "de::opt_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub note_id: Option<i64>,

    #[serde(default, deserialize_with = "de::lenient_string")]
    pub raw_content: String,

    #[serde(default, deserialize_with = "de::lenient_string")]
    pub context: String,

    /// Opaque embedding vector; read-only, preserved verbatim.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub embedding: Value,

    /// Opaque precomputed embedding norm; read-only, preserved verbatim.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub norm: Value,

    /// Read-only provenance sequence, parallel to the other two.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub source_turn_ids: Value,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub source_commit_ids: Value,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub source_timestamps: Value,

    /// Ordered, directed, scored outbound edges owned by this note.
    #[serde(default, deserialize_with = "de::link_entries")]
    pub related_note_links: Vec<LinkEntry>,

    /// Unrecognized per-note fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Note {
    /// The note's id, when the document carried a well-formed one.
    pub fn id(&self) -> Option<i64> {
        self.note_id
    }

    /// Iterate the well-formed `(target, score)` outbound links, skipping
    /// malformed entries.
    pub fn related_links(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.related_note_links.iter().filter_map(|entry| match entry {
            LinkEntry::Link(target, score) => Some((*target, *score)),
            LinkEntry::Malformed(_) => None,
        })
    }
}

// ============================================================================
// GRAPH
// ============================================================================

/// The full in-memory note graph, as loaded from one snapshot document.
///
/// Mutated in place only through the mutation engine; replaced wholesale on
/// the next load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Graph {
    /// Opaque snapshot metadata (`format_version` and friends).
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,

    /// Ordered note sequence. Array position is the alignment key for
    /// `cluster_labels`.
    #[serde(default)]
    pub notes: Vec<Note>,

    /// Optional cluster assignment, positionally aligned to `notes`.
    /// Entries are read through `as_i64`; the vector itself is preserved
    /// verbatim so deletion can keep positional alignment intact.
    #[serde(
        default,
        deserialize_with = "de::opt_value_vec",
        skip_serializing_if = "Option::is_none"
    )]
    pub cluster_labels: Option<Vec<Value>>,

    /// Opaque, preserved but not interpreted.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub cluster_centroids: Value,

    /// Opaque, preserved but not interpreted.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub cluster_centroid_norms: Value,

    /// Global cross-cluster relations, undirected.
    #[serde(
        default,
        deserialize_with = "de::opt_long_range_entries",
        skip_serializing_if = "Option::is_none"
    )]
    pub long_range_links: Option<Vec<LongRangeEntry>>,

    /// Unrecognized top-level fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Graph {
    /// Parse a raw snapshot document.
    ///
    /// Fails only when the root is not an object or `notes` is missing or
    /// not a sequence; every note-level malformation parses leniently and
    /// surfaces through the validator instead.
    pub fn from_value(document: Value) -> Result<Self, ParseError> {
        let Some(root) = document.as_object() else {
            return Err(ParseError::RootNotObject);
        };
        if !matches!(root.get("notes"), Some(Value::Array(_))) {
            return Err(ParseError::NotesNotSequence);
        }
        Ok(serde_json::from_value(document)?)
    }

    /// Cluster label at a note position, when present and integer-shaped.
    pub fn cluster_label_at(&self, position: usize) -> Option<i64> {
        self.cluster_labels
            .as_ref()
            .and_then(|labels| labels.get(position))
            .and_then(Value::as_i64)
    }

    /// Iterate the well-formed long-range triples.
    pub fn long_range_triples(&self) -> impl Iterator<Item = (i64, i64, f64)> + '_ {
        self.long_range_links
            .iter()
            .flatten()
            .filter_map(|entry| match entry {
                LongRangeEntry::Link(a, b, score) => Some((*a, *b, *score)),
                LongRangeEntry::Malformed(_) => None,
            })
    }
}

// ============================================================================
// LENIENT DESERIALIZERS
// ============================================================================

mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{LinkEntry, LongRangeEntry};

    /// Accept any value; yield `Some` only for well-formed integers.
    pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_i64())
    }

    /// Accept any value; strings pass through, null becomes empty, and
    /// other scalars keep their textual rendering.
    pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    /// Non-array containers collapse to an empty list; entries parse
    /// individually into `Link`/`Malformed`.
    pub fn link_entries<'de, D>(deserializer: D) -> Result<Vec<LinkEntry>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let Value::Array(items) = value else {
            return Ok(Vec::new());
        };
        Ok(items.into_iter().map(parse_link_entry).collect())
    }

    /// Non-array containers are treated as absent.
    pub fn opt_long_range_entries<'de, D>(
        deserializer: D,
    ) -> Result<Option<Vec<LongRangeEntry>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let Value::Array(items) = value else {
            return Ok(None);
        };
        Ok(Some(items.into_iter().map(parse_long_range_entry).collect()))
    }

    pub fn opt_value_vec<'de, D>(deserializer: D) -> Result<Option<Vec<Value>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Array(items) => Some(items),
            _ => None,
        })
    }

    fn parse_link_entry(value: Value) -> LinkEntry {
        if let Some(items) = value.as_array() {
            if items.len() == 2 {
                if let (Some(target), Some(score)) = (items[0].as_i64(), items[1].as_f64()) {
                    return LinkEntry::Link(target, score);
                }
            }
        }
        LinkEntry::Malformed(value)
    }

    fn parse_long_range_entry(value: Value) -> LongRangeEntry {
        if let Some(items) = value.as_array() {
            if items.len() == 3 {
                if let (Some(a), Some(b), Some(score)) =
                    (items[0].as_i64(), items[1].as_i64(), items[2].as_f64())
                {
                    return LongRangeEntry::Link(a, b, score);
                }
            }
        }
        LongRangeEntry::Malformed(value)
    }
}
