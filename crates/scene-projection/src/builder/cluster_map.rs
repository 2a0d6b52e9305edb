//! Global overview: cluster-quota sample of the whole graph.

use std::collections::{BTreeMap, HashSet};

use notegraph_core::GraphStore;

use super::{sort_scored, CandidateEdges, CLUSTER_MAP_LINKS_PER_NOTE, CLUSTER_MAP_SAMPLE_CAP};
use crate::normalize::{compute_domain, normalized_to_raw_score};
use crate::request::ViewParams;
use crate::scene::{EdgeKind, NodeKind, Scene, SceneNode};

/// Sample the graph under a per-cluster quota, then connect the sample
/// with each note's strongest outbound links and the global long-range
/// top-K.
pub(crate) fn build(store: &GraphStore, selected: Option<i64>, params: &ViewParams) -> Scene {
    let indexes = store.indexes();

    let mut sample: Vec<i64> = Vec::new();
    let mut in_sample: HashSet<i64> = HashSet::new();

    if let Some(id) = selected {
        if store.contains(id) {
            admit(&mut sample, &mut in_sample, id);
        }
    }

    // Per-cluster quota over clusters in ascending id order.
    if !indexes.cluster_counts.is_empty() {
        let quota = CLUSTER_MAP_SAMPLE_CAP.div_ceil(indexes.cluster_counts.len());
        let mut members: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for (&id, &cluster) in &indexes.cluster_of {
            members.entry(cluster).or_default().push(id);
        }
        'clusters: for ids in members.values_mut() {
            ids.sort_unstable();
            for &id in ids.iter().take(quota) {
                if sample.len() >= CLUSTER_MAP_SAMPLE_CAP {
                    break 'clusters;
                }
                admit(&mut sample, &mut in_sample, id);
            }
        }
    }

    // Fill the remaining budget with the lowest ids overall.
    if sample.len() < CLUSTER_MAP_SAMPLE_CAP {
        let mut all: Vec<i64> = indexes.by_id.keys().copied().collect();
        all.sort_unstable();
        for id in all {
            if sample.len() >= CLUSTER_MAP_SAMPLE_CAP {
                break;
            }
            admit(&mut sample, &mut in_sample, id);
        }
    }

    let mut candidates = CandidateEdges::new();
    for &id in &sample {
        let Some(note) = store.note(id) else { continue };
        let mut outbound: Vec<(i64, f64)> = note
            .related_links()
            .filter(|(target, _)| store.contains(*target))
            .collect();
        sort_scored(&mut outbound);
        outbound.truncate(CLUSTER_MAP_LINKS_PER_NOTE);
        for (target, score) in outbound {
            if !in_sample.contains(&target) {
                continue;
            }
            candidates.push_unordered(id, target, EdgeKind::Related, score);
        }
    }

    if params.include_long_range {
        for &(a, b, score) in indexes.long_range_sorted.iter().take(params.long_range_top_k) {
            if in_sample.contains(&a) && in_sample.contains(&b) {
                candidates.push_unordered(a, b, EdgeKind::LongRange, score);
            }
        }
    }

    let score_values = candidates.scores();
    let score_domain = compute_domain(&score_values);
    let threshold_raw = normalized_to_raw_score(params.min_score_normalized, score_domain.as_ref());

    let nodes = sample
        .iter()
        .map(|&id| SceneNode {
            id,
            kind: if selected == Some(id) {
                NodeKind::Selected
            } else {
                NodeKind::Member
            },
        })
        .collect();
    let edges = candidates.into_filtered(threshold_raw);

    Scene {
        nodes,
        edges,
        score_values,
        score_domain,
        threshold_raw,
    }
}

fn admit(sample: &mut Vec<i64>, in_sample: &mut HashSet<i64>, id: i64) {
    if in_sample.insert(id) {
        sample.push(id);
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
    fn sample_leads_with_selected_then_cluster_quota() {
        let store = store_from(json!({
            "notes": [
                {"note_id": 10}, {"note_id": 11}, {"note_id": 12}, {"note_id": 13}
            ],
            "cluster_labels": [1, 0, 1, 0]
        }));

        let scene = build(&store, Some(12), &ViewParams::default());
        let ids: Vec<i64> = scene.nodes.iter().map(|node| node.id).collect();
        // Selected first, then cluster 0 members (11, 13), then cluster 1.
        assert_eq!(ids, vec![12, 11, 13, 10]);
        assert_eq!(scene.nodes[0].kind, NodeKind::Selected);
        assert!(scene.nodes[1..].iter().all(|n| n.kind == NodeKind::Member));
    }

    #[test]
    fn unclustered_graph_samples_lowest_ids() {
        let store = store_from(json!({
            "notes": [{"note_id": 5}, {"note_id": 1}, {"note_id": 9}]
        }));

        let scene = build(&store, None, &ViewParams::default());
        let ids: Vec<i64> = scene.nodes.iter().map(|node| node.id).collect();
        assert_eq!(ids, vec![1, 5, 9]);
    }

    #[test]
    fn edges_need_both_endpoints_sampled_and_cap_at_three() {
        let store = store_from(json!({
            "notes": [
                {"note_id": 1, "related_note_links": [
                    [2, 0.9], [3, 0.8], [4, 0.7], [5, 0.6]
                ]},
                {"note_id": 2}, {"note_id": 3}, {"note_id": 4}, {"note_id": 5}
            ]
        }));

        let scene = build(&store, None, &ViewParams::default());
        // Top three outbound links only; [5, 0.6] never becomes a candidate.
        let pairs: Vec<(i64, i64)> = scene
            .edges
            .iter()
            .map(|edge| (edge.source, edge.target))
            .collect();
        assert_eq!(pairs, vec![(1, 2), (1, 3), (1, 4)]);
        assert_eq!(scene.score_values.len(), 3);
    }

    #[test]
    fn edges_dedupe_by_unordered_pair_and_category() {
        let store = store_from(json!({
            "notes": [
                {"note_id": 1, "related_note_links": [[2, 0.9]]},
                {"note_id": 2, "related_note_links": [[1, 0.8]]}
            ],
            "long_range_links": [[2, 1, 0.5]]
        }));

        let scene = build(&store, None, &ViewParams::default());
        let related: Vec<_> = scene
            .edges
            .iter()
            .filter(|edge| edge.kind == EdgeKind::Related)
            .collect();
        assert_eq!(related.len(), 1);
        assert_eq!((related[0].source, related[0].target), (1, 2));
        // The long-range category is distinct, not a duplicate.
        assert_eq!(
            scene
                .edges
                .iter()
                .filter(|edge| edge.kind == EdgeKind::LongRange)
                .count(),
            1
        );
    }

    #[test]
    fn long_range_respects_top_k_and_toggle() {
        let store = store_from(json!({
            "notes": [{"note_id": 1}, {"note_id": 2}, {"note_id": 3}],
            "long_range_links": [[1, 2, 0.9], [2, 3, 0.8], [1, 3, 0.7]]
        }));

        let mut params = ViewParams {
            long_range_top_k: 2,
            ..ViewParams::default()
        };
        let scene = build(&store, None, &params);
        let lr: Vec<f64> = scene
            .edges
            .iter()
            .filter(|edge| edge.kind == EdgeKind::LongRange)
            .map(|edge| edge.score)
            .collect();
        assert_eq!(lr, vec![0.9, 0.8]);

        params.include_long_range = false;
        let scene = build(&store, None, &params);
        assert!(scene.edges.is_empty());
    }

    #[test]
    fn sample_never_exceeds_global_cap() {
        let notes: Vec<_> = (0..1500).map(|i| json!({"note_id": i})).collect();
        let store = store_from(json!({"notes": notes}));

        let scene = build(&store, Some(1400), &ViewParams::default());
        assert_eq!(scene.nodes.len(), CLUSTER_MAP_SAMPLE_CAP);
        assert_eq!(scene.nodes[0].id, 1400);
        assert_eq!(scene.nodes[0].kind, NodeKind::Selected);
        // Fill stage took the lowest ids.
        assert_eq!(scene.nodes[1].id, 0);
        assert_eq!(scene.nodes.last().map(|n| n.id), Some(1198));
    }
}
