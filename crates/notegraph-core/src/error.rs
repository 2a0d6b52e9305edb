//! Error types for the snapshot boundary.

use thiserror::Error;

/// Fatal parse failure at load time. The previous in-memory graph, if any,
/// is retained untouched by the caller.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The snapshot root is not a JSON object.
    #[error("snapshot root is not a JSON object")]
    RootNotObject,

    /// `notes` is missing or not a sequence.
    #[error("snapshot `notes` is missing or not a sequence")]
    NotesNotSequence,

    /// Syntactically malformed JSON.
    #[error("malformed snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reading or writing a snapshot file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Save refused outright: the graph carries blocking validation errors
    /// and nothing was written.
    #[error("snapshot failed validation with {errors} blocking error(s); nothing was written")]
    Invalid { errors: usize },
}
