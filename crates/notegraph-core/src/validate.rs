//! Validation for note graph snapshots.
//!
//! Pure functions with deterministic ordering: note-level checks in note
//! order, then top-level checks. Blocking errors gate saving; warnings
//! never block anything.

use std::collections::HashSet;

use std::fmt;

use serde_json::Value;

use crate::model::{Graph, LinkEntry, LongRangeEntry};

// ============================================================================
// ISSUES
// ============================================================================

/// One validation or mutation diagnostic.
///
/// Blocking issues (`is_blocking`) prevent a save; the rest are advisory.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    /// The document root is not a JSON object.
    RootNotObject,

    /// `notes` is missing or not a sequence.
    NotesNotSequence,

    /// A note has no well-formed integer `note_id`.
    MissingNoteId { position: usize },

    /// Two notes share a `note_id`.
    DuplicateNoteId { note_id: i64, position: usize },

    /// A `related_note_links` entry is not `(integer, number)` shaped.
    MalformedRelatedLink { position: usize, entry: usize },

    /// An optional top-level key is absent.
    MissingOptionalKey { key: &'static str },

    /// `cluster_labels` does not align with `notes`.
    ClusterLabelsLengthMismatch { labels: usize, notes: usize },

    /// A `long_range_links` entry is not `(integer, integer, number)` shaped.
    MalformedLongRangeLink { index: usize },

    /// A related link points at a note_id absent from the graph.
    DanglingRelatedLink { source: i64, target: i64 },

    /// An edit dropped related-link targets that do not exist.
    UnknownTargetsDropped { source: i64, dropped: Vec<i64> },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotObject => write!(f, "document root is not an object"),
            Self::NotesNotSequence => write!(f, "`notes` is missing or not a sequence"),
            Self::MissingNoteId { position } => {
                write!(f, "note at position {position} is missing an integer note_id")
            }
            Self::DuplicateNoteId { note_id, position } => {
                write!(f, "duplicate note_id {note_id} at position {position}")
            }
            Self::MalformedRelatedLink { position, entry } => write!(
                f,
                "note at position {position}: related link entry {entry} is not (integer, number) shaped"
            ),
            Self::MissingOptionalKey { key } => {
                write!(f, "optional top-level key `{key}` is missing")
            }
            Self::ClusterLabelsLengthMismatch { labels, notes } => {
                write!(f, "cluster_labels has {labels} entries but there are {notes} notes")
            }
            Self::MalformedLongRangeLink { index } => {
                write!(f, "long_range_links entry {index} is not (integer, integer, number) shaped")
            }
            Self::DanglingRelatedLink { source, target } => {
                write!(f, "note {source} has a related link to missing note {target}")
            }
            Self::UnknownTargetsDropped { source, dropped } => {
                write!(f, "edit of note {source} dropped unknown target id(s) {dropped:?}")
            }
        }
    }
}

impl std::error::Error for ValidationIssue {}

impl ValidationIssue {
    /// Stable machine-readable code for this issue type.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RootNotObject => "ROOT_NOT_OBJECT",
            Self::NotesNotSequence => "NOTES_NOT_SEQUENCE",
            Self::MissingNoteId { .. } => "MISSING_NOTE_ID",
            Self::DuplicateNoteId { .. } => "DUPLICATE_NOTE_ID",
            Self::MalformedRelatedLink { .. } => "MALFORMED_RELATED_LINK",
            Self::MissingOptionalKey { .. } => "MISSING_OPTIONAL_KEY",
            Self::ClusterLabelsLengthMismatch { .. } => "CLUSTER_LABELS_LENGTH_MISMATCH",
            Self::MalformedLongRangeLink { .. } => "MALFORMED_LONG_RANGE_LINK",
            Self::DanglingRelatedLink { .. } => "DANGLING_RELATED_LINK",
            Self::UnknownTargetsDropped { .. } => "UNKNOWN_TARGETS_DROPPED",
        }
    }

    /// Whether this issue blocks saving.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::RootNotObject
                | Self::NotesNotSequence
                | Self::MissingNoteId { .. }
                | Self::DuplicateNoteId { .. }
                | Self::MalformedRelatedLink { .. }
        )
    }
}

/// Result of validating a graph or raw document.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Blocking errors (save must not proceed).
    pub errors: Vec<ValidationIssue>,
    /// Non-blocking warnings.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed (no blocking errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Route an issue by severity.
    pub fn add(&mut self, issue: ValidationIssue) {
        if issue.is_blocking() {
            self.errors.push(issue);
        } else {
            self.warnings.push(issue);
        }
    }

    /// Total count of issues.
    pub fn issue_count(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Validate a parsed graph.
///
/// Iterates notes first (ids, link shapes, dangling references), then runs
/// top-level checks (optional keys, label alignment, long-range shapes).
pub fn validate(graph: &Graph) -> ValidationResult {
    let mut result = ValidationResult::new();

    let known_ids: HashSet<i64> = graph.notes.iter().filter_map(|note| note.id()).collect();

    let mut seen: HashSet<i64> = HashSet::new();
    for (position, note) in graph.notes.iter().enumerate() {
        match note.id() {
            None => result.add(ValidationIssue::MissingNoteId { position }),
            Some(note_id) => {
                if !seen.insert(note_id) {
                    result.add(ValidationIssue::DuplicateNoteId { note_id, position });
                }
            }
        }

        for (entry, link) in note.related_note_links.iter().enumerate() {
            match link {
                LinkEntry::Malformed(_) => {
                    result.add(ValidationIssue::MalformedRelatedLink { position, entry });
                }
                LinkEntry::Link(target, _) => {
                    if let Some(source) = note.id() {
                        if !known_ids.contains(target) {
                            result.add(ValidationIssue::DanglingRelatedLink {
                                source,
                                target: *target,
                            });
                        }
                    }
                }
            }
        }
    }

    if graph.metadata.is_null() {
        result.add(ValidationIssue::MissingOptionalKey { key: "metadata" });
    }
    if graph.cluster_labels.is_none() {
        result.add(ValidationIssue::MissingOptionalKey { key: "cluster_labels" });
    }
    if graph.cluster_centroids.is_null() {
        result.add(ValidationIssue::MissingOptionalKey { key: "cluster_centroids" });
    }
    if graph.cluster_centroid_norms.is_null() {
        result.add(ValidationIssue::MissingOptionalKey {
            key: "cluster_centroid_norms",
        });
    }
    if graph.long_range_links.is_none() {
        result.add(ValidationIssue::MissingOptionalKey { key: "long_range_links" });
    }

    if let Some(labels) = &graph.cluster_labels {
        if labels.len() != graph.notes.len() {
            result.add(ValidationIssue::ClusterLabelsLengthMismatch {
                labels: labels.len(),
                notes: graph.notes.len(),
            });
        }
    }

    if let Some(entries) = &graph.long_range_links {
        for (index, entry) in entries.iter().enumerate() {
            if matches!(entry, LongRangeEntry::Malformed(_)) {
                result.add(ValidationIssue::MalformedLongRangeLink { index });
            }
        }
    }

    result
}

/// Validate a raw snapshot document.
///
/// Root-shape failures are reported as blocking errors; a well-shaped
/// document is parsed and validated as a graph.
pub fn validate_document(document: &Value) -> ValidationResult {
    let mut result = ValidationResult::new();

    let Some(root) = document.as_object() else {
        result.add(ValidationIssue::RootNotObject);
        return result;
    };
    if !matches!(root.get("notes"), Some(Value::Array(_))) {
        result.add(ValidationIssue::NotesNotSequence);
        return result;
    }

    match Graph::from_value(document.clone()) {
        Ok(graph) => validate(&graph),
        Err(_) => result,
    }
}
