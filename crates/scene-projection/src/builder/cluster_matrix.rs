//! Cluster-pair aggregation matrix.
//!
//! Not a node/edge scene: every related edge (and optionally the global
//! long-range top-K) is mapped to its unordered cluster pair and folded
//! into per-pair count/sum/max statistics. Intensity blends two
//! independently quantile-normalized signals so that neither a single hot
//! pair nor a single huge pair saturates the encoding.

use std::collections::BTreeMap;

use notegraph_core::GraphStore;

use super::{MATRIX_COUNT_WEIGHT, MATRIX_GAMMA, MATRIX_MEAN_WEIGHT};
use crate::normalize::{
    compute_distribution, compute_domain, normalize_by_distribution, normalized_to_raw_score,
};
use crate::request::ViewParams;
use crate::scene::{MatrixCell, MatrixScene};

#[derive(Debug, Clone, Copy)]
struct PairStats {
    count: usize,
    sum: f64,
    max: f64,
}

/// Aggregate edges into unordered cluster-pair cells, hide the weak ones,
/// and encode intensity from the survivors.
pub(crate) fn build(store: &GraphStore, params: &ViewParams) -> MatrixScene {
    let indexes = store.indexes();
    let mut cells: BTreeMap<(i64, i64), PairStats> = BTreeMap::new();

    for note in &store.graph().notes {
        let Some(source) = note.id() else { continue };
        let Some(&source_cluster) = indexes.cluster_of.get(&source) else {
            continue;
        };
        for (target, score) in note.related_links() {
            let Some(&target_cluster) = indexes.cluster_of.get(&target) else {
                continue;
            };
            accumulate(&mut cells, source_cluster, target_cluster, score);
        }
    }

    if params.include_long_range {
        for &(a, b, score) in indexes.long_range_sorted.iter().take(params.long_range_top_k) {
            let (Some(&cluster_a), Some(&cluster_b)) =
                (indexes.cluster_of.get(&a), indexes.cluster_of.get(&b))
            else {
                continue;
            };
            accumulate(&mut cells, cluster_a, cluster_b, score);
        }
    }

    let pair_maxes: Vec<f64> = cells.values().map(|stats| stats.max).collect();
    let score_domain = compute_domain(&pair_maxes);
    let threshold_raw = normalized_to_raw_score(params.min_score_normalized, score_domain.as_ref());

    let visible: Vec<((i64, i64), PairStats)> = cells
        .into_iter()
        .filter(|(_, stats)| stats.max >= threshold_raw)
        .collect();

    let counts: Vec<f64> = visible.iter().map(|(_, stats)| stats.count as f64).collect();
    let means: Vec<f64> = visible
        .iter()
        .map(|(_, stats)| stats.sum / stats.count as f64)
        .collect();
    let count_dist = compute_distribution(&counts, true);
    let mean_dist = compute_distribution(&means, false);

    let cells = visible
        .into_iter()
        .map(|((cluster_a, cluster_b), stats)| {
            let mean = stats.sum / stats.count as f64;
            let count_signal = count_dist
                .as_ref()
                .map(|dist| normalize_by_distribution(stats.count as f64, dist))
                .unwrap_or(0.0);
            let mean_signal = mean_dist
                .as_ref()
                .map(|dist| normalize_by_distribution(mean, dist))
                .unwrap_or(0.0);
            let intensity = MATRIX_COUNT_WEIGHT * count_signal.powf(MATRIX_GAMMA)
                + MATRIX_MEAN_WEIGHT * mean_signal.powf(MATRIX_GAMMA);

            MatrixCell {
                cluster_a,
                cluster_b,
                count: stats.count,
                sum: stats.sum,
                max: stats.max,
                mean,
                intensity,
            }
        })
        .collect();

    MatrixScene {
        cells,
        score_domain,
        threshold_raw,
    }
}

fn accumulate(cells: &mut BTreeMap<(i64, i64), PairStats>, a: i64, b: i64, score: f64) {
    let key = (a.min(b), a.max(b));
    let stats = cells.entry(key).or_insert(PairStats {
        count: 0,
        sum: 0.0,
        max: f64::NEG_INFINITY,
    });
    stats.count += 1;
    stats.sum += score;
    stats.max = stats.max.max(score);
}
