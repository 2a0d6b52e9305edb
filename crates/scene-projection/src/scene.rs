//! Scene payload types handed to the external rendering layer.
//!
//! These are DATA CONTRACTS only - no egui, no layout, no behavior. The
//! renderer may compute node positions from drag interaction, but nothing
//! it produces ever feeds back into the graph store.

use serde::{Deserialize, Serialize};

use crate::normalize::ScoreDomain;

// ============================================================================
// NODE / EDGE ROLES
// ============================================================================

/// Role of a node inside a scene.
///
/// A node reachable through multiple roles keeps the highest-priority one:
/// `selected > outbound/inbound > expanded/member > long_range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// The focused note.
    Selected,
    /// Direct outbound neighbor of the selected note.
    Outbound,
    /// Direct inbound neighbor of the selected note.
    Inbound,
    /// Reached by expansion beyond the first hop.
    Expanded,
    /// Sampled member of the global overview.
    Member,
    /// Touched only by a long-range edge.
    LongRange,
}

impl NodeKind {
    /// Precedence rank; lower wins when roles collide.
    pub(crate) fn priority(self) -> u8 {
        match self {
            NodeKind::Selected => 0,
            NodeKind::Outbound | NodeKind::Inbound => 1,
            NodeKind::Expanded | NodeKind::Member => 2,
            NodeKind::LongRange => 3,
        }
    }
}

/// Relation category of a scene edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Outbound related link of the selected note.
    Outbound,
    /// Inbound related link of the selected note.
    Inbound,
    /// Related link discovered during deeper expansion.
    Expanded,
    /// Related link between two sampled notes.
    Related,
    /// Long-range link.
    LongRange,
}

// ============================================================================
// GRAPH SCENES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: i64,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEdge {
    pub source: i64,
    pub target: i64,
    pub kind: EdgeKind,
    pub score: f64,
}

/// Bounded node/edge payload for one view.
///
/// `score_values` carries every candidate edge score observed while
/// building the scene, including edges later excluded by the threshold,
/// so the renderer's legend reflects the true local distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<SceneEdge>,
    pub score_values: Vec<f64>,
    pub score_domain: Option<ScoreDomain>,
    pub threshold_raw: f64,
}

// ============================================================================
// CLUSTER MATRIX
// ============================================================================

/// Aggregated statistics for one unordered cluster pair.
///
/// `cluster_a <= cluster_b` always; self-pairs are valid and meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub cluster_a: i64,
    pub cluster_b: i64,
    pub count: usize,
    pub sum: f64,
    pub max: f64,
    pub mean: f64,
    /// Blend of quantile-normalized log-compressed count (35%) and
    /// quantile-normalized mean score (65%), each raised to the 0.8 power.
    pub intensity: f64,
}

/// Cluster-aggregation payload: not a node/edge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MatrixScene {
    /// Visible cells, ordered by `(cluster_a, cluster_b)`. Cells whose max
    /// score fell below the threshold are omitted.
    pub cells: Vec<MatrixCell>,
    /// Domain of the per-pair max scores.
    pub score_domain: Option<ScoreDomain>,
    pub threshold_raw: f64,
}

/// Output of one view build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scene", rename_all = "snake_case")]
pub enum ViewScene {
    Graph(Scene),
    Matrix(MatrixScene),
}

impl ViewScene {
    /// The graph payload, when this is a node/edge scene.
    pub fn as_graph(&self) -> Option<&Scene> {
        match self {
            ViewScene::Graph(scene) => Some(scene),
            ViewScene::Matrix(_) => None,
        }
    }

    /// The matrix payload, when this is an aggregate scene.
    pub fn as_matrix(&self) -> Option<&MatrixScene> {
        match self {
            ViewScene::Matrix(scene) => Some(scene),
            ViewScene::Graph(_) => None,
        }
    }
}
