//! View requests: one tagged variant per analytical mode.

use serde::{Deserialize, Serialize};

/// Parameters shared by all view modes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewParams {
    /// Per-note cap on outbound/inbound expansion candidates. Minimum 1.
    pub related_limit: usize,
    /// Breadth-first expansion depth, clamped to `1..=3`.
    pub depth: usize,
    /// User-facing [0,1] score cutoff, mapped linearly onto the scores
    /// observed while building the scene.
    pub min_score_normalized: f64,
    /// Global cap on long-range edges considered by a view.
    pub long_range_top_k: usize,
    /// Whether long-range edges participate at all.
    pub include_long_range: bool,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            related_limit: 8,
            depth: 1,
            min_score_normalized: 0.0,
            long_range_top_k: 40,
            include_long_range: true,
        }
    }
}

impl ViewParams {
    /// Copy with every field forced into its valid range.
    pub fn clamped(&self) -> Self {
        Self {
            related_limit: self.related_limit.max(1),
            depth: self.depth.clamp(1, 3),
            min_score_normalized: self.min_score_normalized.clamp(0.0, 1.0),
            long_range_top_k: self.long_range_top_k,
            include_long_range: self.include_long_range,
        }
    }
}

/// One view to build, with its mode-specific inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ViewRequest {
    /// Single-note focus: bounded breadth-first neighborhood.
    Neighborhood {
        selected: i64,
        #[serde(default)]
        params: ViewParams,
    },
    /// Global overview: cluster-quota sample of the whole graph.
    ClusterMap {
        #[serde(default)]
        selected: Option<i64>,
        #[serde(default)]
        params: ViewParams,
    },
    /// Only the global top-K long-range edges and the notes they touch.
    LongRange {
        #[serde(default)]
        selected: Option<i64>,
        #[serde(default)]
        params: ViewParams,
    },
    /// Cluster-pair aggregation matrix.
    ClusterMatrix {
        #[serde(default)]
        params: ViewParams,
    },
}

impl ViewRequest {
    /// Mode name for logging.
    pub fn mode(&self) -> &'static str {
        match self {
            ViewRequest::Neighborhood { .. } => "neighborhood",
            ViewRequest::ClusterMap { .. } => "cluster_map",
            ViewRequest::LongRange { .. } => "long_range",
            ViewRequest::ClusterMatrix { .. } => "cluster_matrix",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn params_clamp_into_valid_ranges() {
        let params = ViewParams {
            related_limit: 0,
            depth: 9,
            min_score_normalized: 1.7,
            long_range_top_k: 10,
            include_long_range: false,
        };
        let clamped = params.clamped();
        assert_eq!(clamped.related_limit, 1);
        assert_eq!(clamped.depth, 3);
        assert_eq!(clamped.min_score_normalized, 1.0);

        let low = ViewParams {
            depth: 0,
            min_score_normalized: -0.5,
            ..ViewParams::default()
        }
        .clamped();
        assert_eq!(low.depth, 1);
        assert_eq!(low.min_score_normalized, 0.0);
    }

    #[test]
    fn requests_round_trip_as_tagged_json() {
        let request = ViewRequest::Neighborhood {
            selected: 7,
            params: ViewParams::default(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["mode"], "neighborhood");
        assert_eq!(json["selected"], 7);
        let back: ViewRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }
}
