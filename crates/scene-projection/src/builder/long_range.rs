//! Long-range only: the global top-K cross-cluster edges and nothing else.

use std::collections::HashSet;

use notegraph_core::GraphStore;

use crate::normalize::{compute_domain, normalized_to_raw_score};
use crate::request::ViewParams;
use crate::scene::{EdgeKind, NodeKind, Scene, SceneEdge, SceneNode};

/// Take the top-K global long-range triples by descending score, filter by
/// the threshold, and expose exactly the notes touched by surviving edges.
pub(crate) fn build(store: &GraphStore, selected: Option<i64>, params: &ViewParams) -> Scene {
    let top: Vec<(i64, i64, f64)> = store
        .indexes()
        .long_range_sorted
        .iter()
        .take(params.long_range_top_k)
        .copied()
        .collect();

    let score_values: Vec<f64> = top.iter().map(|&(_, _, score)| score).collect();
    let score_domain = compute_domain(&score_values);
    let threshold_raw = normalized_to_raw_score(params.min_score_normalized, score_domain.as_ref());

    let mut nodes: Vec<SceneNode> = Vec::new();
    let mut touched: HashSet<i64> = HashSet::new();
    let mut edges: Vec<SceneEdge> = Vec::new();

    for (a, b, score) in top {
        if score < threshold_raw {
            continue;
        }
        edges.push(SceneEdge {
            source: a,
            target: b,
            kind: EdgeKind::LongRange,
            score,
        });
        for id in [a, b] {
            if touched.insert(id) {
                nodes.push(SceneNode {
                    id,
                    kind: if selected == Some(id) {
                        NodeKind::Selected
                    } else {
                        NodeKind::LongRange
                    },
                });
            }
        }
    }

    Scene {
        nodes,
        edges,
        score_values,
        score_domain,
        threshold_raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store_from(doc: serde_json::Value) -> GraphStore {
        GraphStore::from_value(doc).unwrap()
    }

    #[test]
    fn exposes_only_notes_touched_by_surviving_edges() {
        let store = store_from(json!({
            "notes": [
                {"note_id": 1}, {"note_id": 2}, {"note_id": 3},
                {"note_id": 4}, {"note_id": 5}
            ],
            "long_range_links": [[1, 2, 0.9], [3, 4, 0.2], [2, 3, 0.6]]
        }));

        let params = ViewParams {
            min_score_normalized: 0.5,
            ..ViewParams::default()
        };
        let scene = build(&store, Some(2), &params);

        // Domain 0.2..0.9 puts the raw threshold at 0.55: [3,4,0.2] drops.
        assert!((scene.threshold_raw - 0.55).abs() < 1e-12);
        assert_eq!(scene.edges.len(), 2);
        let ids: Vec<i64> = scene.nodes.iter().map(|node| node.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(!ids.contains(&4));
        assert!(!ids.contains(&5));

        let kind_of = |id: i64| scene.nodes.iter().find(|n| n.id == id).map(|n| n.kind);
        assert_eq!(kind_of(2), Some(NodeKind::Selected));
        assert_eq!(kind_of(1), Some(NodeKind::LongRange));
        assert_eq!(scene.score_values.len(), 3);
    }

    #[test]
    fn top_k_bounds_the_candidate_set() {
        let store = store_from(json!({
            "notes": [{"note_id": 1}, {"note_id": 2}, {"note_id": 3}, {"note_id": 4}],
            "long_range_links": [[1, 2, 0.9], [2, 3, 0.8], [3, 4, 0.7], [1, 4, 0.6]]
        }));

        let params = ViewParams {
            long_range_top_k: 2,
            ..ViewParams::default()
        };
        let scene = build(&store, None, &params);
        assert_eq!(scene.score_values, vec![0.9, 0.8]);
        assert_eq!(scene.edges.len(), 2);
        let ids: Vec<i64> = scene.nodes.iter().map(|node| node.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn empty_long_range_set_yields_empty_scene() {
        let store = store_from(json!({"notes": [{"note_id": 1}]}));
        let scene = build(&store, Some(1), &ViewParams::default());
        assert_eq!(scene, Scene::default());
    }
}
