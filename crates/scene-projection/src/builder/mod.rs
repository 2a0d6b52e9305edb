//! The four scene extraction strategies.
//!
//! Each builder is a pure function of the current [`GraphStore`] snapshot
//! plus the supplied parameters: no state machine, no suspension points.
//! Every mode is bounded by fixed ceilings, so construction always
//! terminates in bounded work.

use std::cmp::Ordering;
use std::collections::HashSet;

use notegraph_core::GraphStore;
use tracing::debug;

use crate::request::ViewRequest;
use crate::scene::{EdgeKind, SceneEdge, ViewScene};

pub(crate) mod cluster_map;
pub(crate) mod cluster_matrix;
pub(crate) mod long_range;
pub(crate) mod neighborhood;

/// Hard ceiling on nodes in a neighborhood scene.
pub const NEIGHBORHOOD_NODE_CAP: usize = 120;

/// Hard ceiling on the cluster-map sample.
pub const CLUSTER_MAP_SAMPLE_CAP: usize = 1200;

/// Outbound candidates considered per sampled note in the cluster map.
pub const CLUSTER_MAP_LINKS_PER_NOTE: usize = 3;

/// Hard ceiling on long-range edges appended to a neighborhood.
pub const LONG_RANGE_APPEND_CAP: usize = 50;

/// Matrix intensity blend: weight of the log-compressed edge count.
pub const MATRIX_COUNT_WEIGHT: f64 = 0.35;

/// Matrix intensity blend: weight of the linear mean score.
pub const MATRIX_MEAN_WEIGHT: f64 = 0.65;

/// Exponent applied to each matrix signal before blending.
pub const MATRIX_GAMMA: f64 = 0.8;

/// Build the scene for one view request.
pub fn build_scene(store: &GraphStore, request: &ViewRequest) -> ViewScene {
    let scene = match request {
        ViewRequest::Neighborhood { selected, params } => {
            ViewScene::Graph(neighborhood::build(store, *selected, &params.clamped()))
        }
        ViewRequest::ClusterMap { selected, params } => {
            ViewScene::Graph(cluster_map::build(store, *selected, &params.clamped()))
        }
        ViewRequest::LongRange { selected, params } => {
            ViewScene::Graph(long_range::build(store, *selected, &params.clamped()))
        }
        ViewRequest::ClusterMatrix { params } => {
            ViewScene::Matrix(cluster_matrix::build(store, &params.clamped()))
        }
    };

    match &scene {
        ViewScene::Graph(graph) => debug!(
            mode = request.mode(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "built scene"
        ),
        ViewScene::Matrix(matrix) => debug!(
            mode = request.mode(),
            cells = matrix.cells.len(),
            "built scene"
        ),
    }

    scene
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Candidate edge accumulator with duplicate suppression.
///
/// Directed pushes key on `(source, target, kind)`; unordered pushes key on
/// the normalized endpoint pair plus kind. Scores of every accepted
/// candidate are retained even when the threshold later drops the edge.
#[derive(Debug, Default)]
pub(crate) struct CandidateEdges {
    edges: Vec<SceneEdge>,
    keys: HashSet<(i64, i64, EdgeKind)>,
}

impl CandidateEdges {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_directed(&mut self, source: i64, target: i64, kind: EdgeKind, score: f64) {
        if self.keys.insert((source, target, kind)) {
            self.edges.push(SceneEdge { source, target, kind, score });
        }
    }

    pub(crate) fn push_unordered(&mut self, a: i64, b: i64, kind: EdgeKind, score: f64) {
        if self.keys.insert((a.min(b), a.max(b), kind)) {
            self.edges.push(SceneEdge { source: a, target: b, kind, score });
        }
    }

    pub(crate) fn scores(&self) -> Vec<f64> {
        self.edges.iter().map(|edge| edge.score).collect()
    }

    /// Consume, keeping only edges at or above the raw threshold.
    pub(crate) fn into_filtered(self, threshold: f64) -> Vec<SceneEdge> {
        self.edges
            .into_iter()
            .filter(|edge| edge.score >= threshold)
            .collect()
    }
}

/// Descending score, ties by ascending id.
pub(crate) fn sort_scored(entries: &mut [(i64, f64)]) {
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
}
