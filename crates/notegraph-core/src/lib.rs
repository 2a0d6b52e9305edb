//! Semantic note graph core: model, derived indexes, validation, mutation.
//!
//! The crate owns the in-memory graph loaded from a JSON snapshot and keeps
//! it internally consistent under edits and deletions. Scene extraction for
//! visualization lives in the sibling `scene-projection` crate; rendering
//! is an external collaborator.
//!
//! # Architecture
//!
//! ```text
//! snapshot file ──► snapshot::read_snapshot ──► Graph
//!                                                 │
//!                                                 ▼
//!                                          GraphStore::load
//!                                                 │ build_indexes
//!                                                 ▼
//!       validate::validate ◄── reads ──── GraphStore (graph + indexes)
//!                                                 ▲
//!                                                 │ rebuild after write
//!                            MutationEngine (edit_note / delete_note)
//! ```
//!
//! Single-threaded and synchronous by design: a mutation, including its
//! index rebuild, fully completes before any subsequent read.

mod error;
mod model;
mod mutate;
mod session;
mod snapshot;
mod store;
mod validate;

pub use error::{ParseError, SnapshotError};
pub use model::{Graph, LinkEntry, LongRangeEntry, Note};
pub use mutate::{parse_related_links_text, MutationEngine, NoteEdit};
pub use session::Session;
pub use snapshot::{read_snapshot, write_snapshot};
pub use store::{GraphStats, GraphStore, Indexes};
pub use validate::{validate, validate_document, ValidationIssue, ValidationResult};
