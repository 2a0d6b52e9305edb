//! Score statistics shared by the scene builders.
//!
//! Two intentionally different normalization strategies coexist here:
//! threshold mapping is linear over the true score domain so a user-facing
//! [0,1] cutoff feels intuitive, while visual intensity uses rank quantiles
//! over the p10..p90 span so a few extreme values cannot saturate the
//! encoding.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Span below which a range is treated as collapsed.
const COLLAPSE_EPS: f64 = 1e-9;

/// Empirical `[min, max]` of an observed score set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreDomain {
    pub min: f64,
    pub max: f64,
}

/// Rank-quantile summary of an observed value set.
///
/// When built with `use_log`, the values were compressed through
/// `ln(1 + v)` before ranking and the same transform is applied to inputs
/// of [`normalize_by_distribution`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distribution {
    pub min: f64,
    pub max: f64,
    pub p10: f64,
    pub p90: f64,
    log: bool,
}

/// Empirical domain of a score set; `None` when no finite value exists.
pub fn compute_domain(scores: &[f64]) -> Option<ScoreDomain> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &score in scores {
        if !score.is_finite() {
            continue;
        }
        min = min.min(score);
        max = max.max(score);
    }
    if min > max {
        return None;
    }
    Some(ScoreDomain { min, max })
}

/// Quantile summary of a value set, optionally log-compressed.
pub fn compute_distribution(values: &[f64], use_log: bool) -> Option<Distribution> {
    let mut sorted: Vec<f64> = values
        .iter()
        .copied()
        .map(|v| if use_log { (1.0 + v).ln() } else { v })
        .filter(|v| v.is_finite())
        .collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    Some(Distribution {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p10: quantile(&sorted, 0.10),
        p90: quantile(&sorted, 0.90),
        log: use_log,
    })
}

/// Linear-interpolated rank quantile over an ascending-sorted slice.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Map a value into [0,1] against a distribution.
///
/// Primarily over the `p10..p90` span; falls back to the full `min..max`
/// span when that collapses, and to `1.0` when the whole distribution is a
/// single repeated value.
pub fn normalize_by_distribution(value: f64, distribution: &Distribution) -> f64 {
    let value = if distribution.log { (1.0 + value).ln() } else { value };
    if !value.is_finite() {
        return 0.0;
    }

    let robust_span = distribution.p90 - distribution.p10;
    if robust_span > COLLAPSE_EPS {
        return ((value - distribution.p10) / robust_span).clamp(0.0, 1.0);
    }

    let full_span = distribution.max - distribution.min;
    if full_span > COLLAPSE_EPS {
        return ((value - distribution.min) / full_span).clamp(0.0, 1.0);
    }

    1.0
}

/// Linear inverse mapping of a normalized [0,1] threshold onto a raw score
/// domain. Returns `0.0` for a missing or degenerate domain.
pub fn normalized_to_raw_score(normalized: f64, domain: Option<&ScoreDomain>) -> f64 {
    let Some(domain) = domain else {
        return 0.0;
    };
    let span = domain.max - domain.min;
    if span <= COLLAPSE_EPS {
        return 0.0;
    }
    domain.min + normalized.clamp(0.0, 1.0) * span
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn empty_domain_is_none_and_maps_to_zero() {
        assert_eq!(compute_domain(&[]), None);
        assert_eq!(normalized_to_raw_score(0.7, None), 0.0);
        assert_eq!(compute_domain(&[f64::NAN]), None);
    }

    #[test]
    fn degenerate_domain_maps_to_zero() {
        let domain = compute_domain(&[0.5, 0.5, 0.5]).unwrap();
        assert_eq!(normalized_to_raw_score(0.9, Some(&domain)), 0.0);
    }

    #[test]
    fn threshold_mapping_is_linear_over_domain() {
        let domain = compute_domain(&[0.2, 0.8, 0.4]).unwrap();
        assert_eq!(domain, ScoreDomain { min: 0.2, max: 0.8 });
        assert!((normalized_to_raw_score(0.0, Some(&domain)) - 0.2).abs() < 1e-12);
        assert!((normalized_to_raw_score(0.5, Some(&domain)) - 0.5).abs() < 1e-12);
        assert!((normalized_to_raw_score(1.0, Some(&domain)) - 0.8).abs() < 1e-12);
        // Out-of-range inputs clamp instead of extrapolating.
        assert!((normalized_to_raw_score(2.0, Some(&domain)) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let values: Vec<f64> = (0..=10).map(f64::from).collect();
        let dist = compute_distribution(&values, false).unwrap();
        assert!((dist.p10 - 1.0).abs() < 1e-12);
        assert!((dist.p90 - 9.0).abs() < 1e-12);
        assert_eq!(dist.min, 0.0);
        assert_eq!(dist.max, 10.0);
    }

    #[test]
    fn normalization_pins_p10_to_zero_and_p90_to_one() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 50.0];
        let dist = compute_distribution(&values, false).unwrap();
        assert!(dist.p90 > dist.p10);
        assert_eq!(normalize_by_distribution(dist.p10, &dist), 0.0);
        assert_eq!(normalize_by_distribution(dist.p90, &dist), 1.0);
        // The outlier clamps rather than stretching the scale.
        assert_eq!(normalize_by_distribution(50.0, &dist), 1.0);
    }

    #[test]
    fn log_distribution_compresses_before_ranking() {
        let values = [0.0, 1.0, 9.0, 99.0];
        let dist = compute_distribution(&values, true).unwrap();
        assert!((dist.max - (100.0f64).ln()).abs() < 1e-12);
        // The input to normalization goes through the same transform.
        let mid = normalize_by_distribution(9.0, &dist);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn collapsed_robust_span_falls_back_to_full_span() {
        // Nine identical values put p10 == p90; min..max still spreads.
        let values = [5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 0.0, 10.0];
        let dist = compute_distribution(&values, false).unwrap();
        assert!((dist.p90 - dist.p10).abs() < COLLAPSE_EPS);
        assert_eq!(normalize_by_distribution(0.0, &dist), 0.0);
        assert_eq!(normalize_by_distribution(10.0, &dist), 1.0);
        assert_eq!(normalize_by_distribution(5.0, &dist), 0.5);
    }

    #[test]
    fn single_repeated_value_normalizes_to_one() {
        let dist = compute_distribution(&[0.3, 0.3, 0.3], false).unwrap();
        assert_eq!(normalize_by_distribution(0.3, &dist), 1.0);
    }

    proptest! {
        #[test]
        fn normalized_values_stay_in_unit_interval(
            values in proptest::collection::vec(0.0f64..1e6, 1..200),
            probe in 0.0f64..1e6,
            use_log in proptest::bool::ANY,
        ) {
            let dist = compute_distribution(&values, use_log).unwrap();
            let normalized = normalize_by_distribution(probe, &dist);
            prop_assert!((0.0..=1.0).contains(&normalized));
        }

        #[test]
        fn quantiles_are_monotone_in_p(
            values in proptest::collection::vec(-1e6f64..1e6, 2..200),
        ) {
            let dist = compute_distribution(&values, false).unwrap();
            prop_assert!(dist.min <= dist.p10 + 1e-9);
            prop_assert!(dist.p10 <= dist.p90 + 1e-9);
            prop_assert!(dist.p90 <= dist.max + 1e-9);
        }

        #[test]
        fn threshold_mapping_stays_inside_domain(
            values in proptest::collection::vec(-1e6f64..1e6, 1..200),
            normalized in 0.0f64..=1.0,
        ) {
            if let Some(domain) = compute_domain(&values) {
                let raw = normalized_to_raw_score(normalized, Some(&domain));
                if domain.max - domain.min > 1e-9 {
                    prop_assert!(raw >= domain.min - 1e-9);
                    prop_assert!(raw <= domain.max + 1e-9);
                } else {
                    prop_assert_eq!(raw, 0.0);
                }
            }
        }
    }
}
