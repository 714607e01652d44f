//! Post-hoc ranking of a completed graph

use crate::agents::metric;
use crate::events::MetricUpdate;
use crate::seed::round_to;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tourney_graph::{VersionGraph, VersionNode};

/// Component name of the node's own score
pub const COMPONENT_BASE: &str = "base";
/// Component name of test coverage
pub const COMPONENT_COVERAGE: &str = "coverage";
/// Component name of the security sub-score
pub const COMPONENT_SECURITY: &str = "security";
/// Component name of the latency sub-score
pub const COMPONENT_PERFORMANCE: &str = "performance";
/// Key of the total in a `metric-update` payload
pub const COMPOSITE_SCORE: &str = "compositeScore";

/// Latency assumed when a node has none recorded
pub const DEFAULT_LATENCY_MS: f64 = 500.0;

/// Security penalty per static analysis finding
pub const FINDING_PENALTY: f64 = 0.1;

/// Weights of the four score components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight of the node's own score
    pub base: f64,
    /// Weight of coverage
    pub coverage: f64,
    /// Weight of the security sub-score
    pub security: f64,
    /// Weight of the latency sub-score
    pub performance: f64,
}

impl ScoreWeights {
    /// The standard weights
    pub const STANDARD: ScoreWeights = ScoreWeights {
        base: 0.5,
        coverage: 0.2,
        security: 0.2,
        performance: 0.1,
    };

    /// Sum of all weights
    #[inline]
    #[must_use]
    pub fn total(&self) -> f64 {
        self.base + self.coverage + self.security + self.performance
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Ranking entry of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Scored node
    pub node_id: String,
    /// Weighted total, rounded to four places
    pub total_score: f64,
    /// Named sub-scores
    pub components: BTreeMap<String, f64>,
}

impl ScoreBreakdown {
    /// Sub-score by name
    #[inline]
    #[must_use]
    pub fn component(&self, name: &str) -> Option<f64> {
        self.components.get(name).copied()
    }

    /// Payload of the `metric-update` event for this entry
    #[must_use]
    pub fn to_metric_update(&self) -> MetricUpdate {
        let mut metrics = self.components.clone();
        metrics.insert(COMPOSITE_SCORE.to_string(), self.total_score);
        MetricUpdate {
            version_id: self.node_id.clone(),
            metrics,
        }
    }
}

/// Ranks every node of a graph by weighted score
#[derive(Debug, Clone, Default)]
pub struct ScoreEvaluator {
    weights: ScoreWeights,
}

impl ScoreEvaluator {
    /// Evaluator with the standard weights
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator with custom weights
    #[inline]
    #[must_use]
    pub fn with_weights(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Weights in use
    #[inline]
    #[must_use]
    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Score a single node
    #[must_use]
    pub fn score_node(&self, node: &VersionNode) -> ScoreBreakdown {
        let coverage = node.metric(metric::COVERAGE).unwrap_or(0.0);
        let findings = node.metric(metric::SEMGREP_FINDINGS).unwrap_or(0.0);
        let latency = node.metric(metric::LATENCY_MS).unwrap_or(DEFAULT_LATENCY_MS);

        let security = 1.0 - findings * FINDING_PENALTY;
        let performance = (1.0 - latency / 1000.0).max(0.0);
        let w = &self.weights;
        let total = round_to(
            node.score() * w.base
                + coverage * w.coverage
                + security * w.security
                + performance * w.performance,
            4,
        );

        ScoreBreakdown {
            node_id: node.id().to_string(),
            total_score: total,
            components: BTreeMap::from([
                (COMPONENT_BASE.to_string(), node.score()),
                (COMPONENT_COVERAGE.to_string(), coverage),
                (COMPONENT_SECURITY.to_string(), security),
                (COMPONENT_PERFORMANCE.to_string(), performance),
            ]),
        }
    }

    /// Leaderboard, best first; ties keep insertion order
    #[must_use]
    pub fn evaluate(&self, graph: &VersionGraph) -> Vec<ScoreBreakdown> {
        let mut board: Vec<ScoreBreakdown> = graph.nodes().iter().map(|n| self.score_node(n)).collect();
        board.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn standard_weights_sum_to_one() {
        assert!((ScoreWeights::STANDARD.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn defaults_for_missing_metrics() {
        let node = VersionNode::new("n", "bare").with_score(0.6);
        let breakdown = ScoreEvaluator::new().score_node(&node);
        assert_eq!(breakdown.component(COMPONENT_COVERAGE), Some(0.0));
        assert_eq!(breakdown.component(COMPONENT_SECURITY), Some(1.0));
        assert_eq!(breakdown.component(COMPONENT_PERFORMANCE), Some(0.5));
        // 0.3 + 0 + 0.2 + 0.05
        assert!((breakdown.total_score - 0.55).abs() < 1e-9);
    }

    #[test]
    fn slow_nodes_floor_at_zero() {
        let node = VersionNode::new("n", "slow").with_metric(metric::LATENCY_MS, 2500.0);
        let breakdown = ScoreEvaluator::new().score_node(&node);
        assert_eq!(breakdown.component(COMPONENT_PERFORMANCE), Some(0.0));
    }

    #[test]
    fn better_node_ranks_first() {
        let mut graph = VersionGraph::new();
        graph
            .add_node(
                VersionNode::new("b", "B")
                    .with_score(0.4)
                    .with_metric(metric::COVERAGE, 0.5)
                    .with_metric(metric::LATENCY_MS, 600.0),
            )
            .unwrap();
        graph
            .add_node(
                VersionNode::new("a", "A")
                    .with_score(0.9)
                    .with_metric(metric::COVERAGE, 0.95)
                    .with_metric(metric::LATENCY_MS, 200.0),
            )
            .unwrap();

        let board = ScoreEvaluator::new().evaluate(&graph);
        let order: Vec<&str> = board.iter().map(|b| b.node_id.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
        assert!(board[0].total_score > board[1].total_score);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut graph = VersionGraph::new();
        for id in ["first", "second", "third"] {
            graph.add_node(VersionNode::new(id, id).with_score(0.5)).unwrap();
        }
        let board = ScoreEvaluator::new().evaluate(&graph);
        let order: Vec<&str> = board.iter().map(|b| b.node_id.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn metric_update_carries_composite() {
        let node = VersionNode::new("n", "x").with_score(1.0);
        let update = ScoreEvaluator::new().score_node(&node).to_metric_update();
        assert_eq!(update.version_id, "n");
        assert_eq!(update.metrics.len(), 5);
        assert!(update.metrics.contains_key(COMPOSITE_SCORE));
    }

    #[test]
    fn empty_graph_empty_board() {
        assert!(ScoreEvaluator::new().evaluate(&VersionGraph::new()).is_empty());
    }
}
