//! Single-note focus: bounded breadth-first neighborhood extraction.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};

use notegraph_core::GraphStore;

use super::{sort_scored, CandidateEdges, LONG_RANGE_APPEND_CAP, NEIGHBORHOOD_NODE_CAP};
use crate::normalize::{compute_domain, normalized_to_raw_score};
use crate::request::ViewParams;
use crate::scene::{EdgeKind, NodeKind, Scene, SceneNode};

/// Breadth-first expansion from the selected note up to `params.depth`
/// hops, with per-note candidate caps and a fixed node ceiling.
pub(crate) fn build(store: &GraphStore, selected: i64, params: &ViewParams) -> Scene {
    if !store.contains(selected) {
        return Scene::default();
    }

    let mut roles: HashMap<i64, NodeKind> = HashMap::new();
    let mut order: Vec<i64> = Vec::new();
    let mut queue: VecDeque<(i64, usize)> = VecDeque::new();
    let mut candidates = CandidateEdges::new();

    roles.insert(selected, NodeKind::Selected);
    order.push(selected);
    queue.push_back((selected, 0));

    while let Some((id, depth)) = queue.pop_front() {
        if depth >= params.depth {
            continue;
        }
        let first_hop = depth == 0;

        let mut outbound: Vec<(i64, f64)> = store
            .note(id)
            .map(|note| {
                note.related_links()
                    .filter(|(target, _)| store.contains(*target))
                    .collect()
            })
            .unwrap_or_default();
        sort_scored(&mut outbound);
        outbound.truncate(params.related_limit);
        for (target, score) in outbound {
            let (edge_kind, role) = if first_hop {
                (EdgeKind::Outbound, NodeKind::Outbound)
            } else {
                (EdgeKind::Expanded, NodeKind::Expanded)
            };
            candidates.push_directed(id, target, edge_kind, score);
            visit(&mut roles, &mut order, Some(&mut queue), target, depth + 1, role);
        }

        let mut inbound: Vec<(i64, f64)> = store
            .indexes()
            .reverse_related
            .get(&id)
            .map(|sources| sources.iter().map(|(&source, &score)| (source, score)).collect())
            .unwrap_or_default();
        sort_scored(&mut inbound);
        inbound.truncate(params.related_limit);
        for (source, score) in inbound {
            let (edge_kind, role) = if first_hop {
                (EdgeKind::Inbound, NodeKind::Inbound)
            } else {
                (EdgeKind::Expanded, NodeKind::Expanded)
            };
            candidates.push_directed(source, id, edge_kind, score);
            visit(&mut roles, &mut order, Some(&mut queue), source, depth + 1, role);
        }
    }

    // Long-range links of the selected note join independent of BFS depth.
    if params.include_long_range {
        let cap = params
            .related_limit
            .min(LONG_RANGE_APPEND_CAP)
            .min(params.long_range_top_k);
        if let Some(adjacent) = store.indexes().long_range_adj.get(&selected) {
            for &(other, score) in adjacent.iter().take(cap) {
                candidates.push_directed(selected, other, EdgeKind::LongRange, score);
                visit(&mut roles, &mut order, None, other, 0, NodeKind::LongRange);
            }
        }
    }

    let score_values = candidates.scores();
    let score_domain = compute_domain(&score_values);
    let threshold_raw = normalized_to_raw_score(params.min_score_normalized, score_domain.as_ref());

    let kept: HashSet<i64> = order.iter().copied().take(NEIGHBORHOOD_NODE_CAP).collect();
    let nodes: Vec<SceneNode> = order
        .iter()
        .take(NEIGHBORHOOD_NODE_CAP)
        .filter_map(|id| roles.get(id).map(|&kind| SceneNode { id: *id, kind }))
        .collect();
    let edges = candidates
        .into_filtered(threshold_raw)
        .into_iter()
        .filter(|edge| kept.contains(&edge.source) && kept.contains(&edge.target))
        .collect();

    Scene {
        nodes,
        edges,
        score_values,
        score_domain,
        threshold_raw,
    }
}

/// Merge a role (highest precedence wins) and queue the note on first
/// discovery. A note queued at a shallower depth is never re-queued.
fn visit(
    roles: &mut HashMap<i64, NodeKind>,
    order: &mut Vec<i64>,
    queue: Option<&mut VecDeque<(i64, usize)>>,
    id: i64,
    depth: usize,
    role: NodeKind,
) {
    match roles.entry(id) {
        Entry::Occupied(mut entry) => {
            if role.priority() < entry.get().priority() {
                entry.insert(role);
            }
        }
        Entry::Vacant(entry) => {
            entry.insert(role);
            order.push(id);
            if let Some(queue) = queue {
                queue.push_back((id, depth));
            }
        }
    }
}
