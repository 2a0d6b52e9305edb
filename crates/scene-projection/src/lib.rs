//! Scene projection: bounded, render-ready views over a semantic note
//! graph.
//!
//! This crate turns the full graph owned by `notegraph-core` into small
//! "scenes" an external renderer can draw: either a node/edge payload or a
//! cluster-aggregation matrix.
//!
//! # Architecture
//!
//! ```text
//! ViewRequest (tagged: mode + params)
//!        │
//!        ▼
//! builder::build_scene ── reads ──► GraphStore (graph + indexes)
//!        │
//!        ├──► neighborhood    (BFS focus, node cap 120)
//!        ├──► cluster_map     (quota sample, cap 1200)
//!        ├──► long_range      (global top-K)
//!        └──► cluster_matrix  (pair aggregation)
//!        │
//!        ▼
//! ViewScene { Graph(Scene) | Matrix(MatrixScene) }
//! ```
//!
//! Two normalization strategies are deliberately distinct: thresholds map
//! linearly over the true score domain, while visual intensity uses rank
//! quantiles so a handful of extreme values cannot saturate the encoding.
//! Both behave predictably from a handful of notes up to several thousand.

mod builder;
mod normalize;
mod request;
mod scene;

pub use builder::{
    build_scene, CLUSTER_MAP_LINKS_PER_NOTE, CLUSTER_MAP_SAMPLE_CAP, LONG_RANGE_APPEND_CAP,
    MATRIX_COUNT_WEIGHT, MATRIX_GAMMA, MATRIX_MEAN_WEIGHT, NEIGHBORHOOD_NODE_CAP,
};
pub use normalize::{
    compute_distribution, compute_domain, normalize_by_distribution, normalized_to_raw_score,
    Distribution, ScoreDomain,
};
pub use request::{ViewParams, ViewRequest};
pub use scene::{EdgeKind, MatrixCell, MatrixScene, NodeKind, Scene, SceneEdge, SceneNode, ViewScene};
