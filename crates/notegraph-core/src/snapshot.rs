//! Snapshot file boundary.
//!
//! The only place the core touches the filesystem. Reading parses the raw
//! JSON document; writing validates first and refuses entirely (the file
//! is untouched) when any blocking error is present.

use std::fs;
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::SnapshotError;
use crate::model::Graph;
use crate::validate::validate;

/// Read and parse a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<Graph, SnapshotError> {
    let file = fs::File::open(path)?;
    let document: Value = serde_json::from_reader(BufReader::new(file))?;
    let graph = Graph::from_value(document)?;
    debug!(path = %path.display(), notes = graph.notes.len(), "read snapshot");
    Ok(graph)
}

/// Serialize a graph back to disk, preserving note order, positional
/// labels, and unrecognized fields verbatim.
///
/// Refused with [`SnapshotError::Invalid`], with no partial write, when the
/// graph has blocking validation errors.
pub fn write_snapshot(graph: &Graph, path: &Path) -> Result<(), SnapshotError> {
    let result = validate(graph);
    if !result.is_valid() {
        return Err(SnapshotError::Invalid {
            errors: result.errors.len(),
        });
    }

    let bytes = serde_json::to_vec(graph)?;
    fs::write(path, bytes)?;
    debug!(path = %path.display(), notes = graph.notes.len(), "wrote snapshot");
    Ok(())
}
