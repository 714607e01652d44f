//! Implementation variants

use super::{metric, Agent, AgentContext, AgentRole};
use crate::error::AgentError;
use crate::seed::round_to;
use rand::rngs::StdRng;
use rand::Rng;
use tourney_graph::{NodeStatus, TestResult, VersionGraph, VersionNode};

/// Implementation targets, rotated by variant index
pub const IMPLEMENTATION_TARGETS: [&str; 4] = [
    "TypeScript frontend",
    "Python orchestrator",
    "Infrastructure IaC",
    "CI pipeline",
];

/// Produces one `running` implementation node parented to an architecture
#[derive(Debug)]
pub struct Coder {
    name: String,
    variant_index: usize,
    rng: StdRng,
}

impl Coder {
    /// Create the coder of variant `variant_index` (zero-based)
    #[must_use]
    pub fn new(variant_index: usize, rng: StdRng) -> Self {
        Self {
            name: format!("coder-{variant_index}"),
            variant_index,
            rng,
        }
    }

    /// One-based variant number written on the node
    #[inline]
    #[must_use]
    pub fn variant(&self) -> u32 {
        u32::try_from(self.variant_index + 1).unwrap_or(u32::MAX)
    }
}

impl Agent for Coder {
    fn role(&self) -> AgentRole {
        AgentRole::Coder
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn run(
        &mut self,
        _graph: &mut VersionGraph,
        ctx: &AgentContext<'_>,
    ) -> Result<Vec<VersionNode>, AgentError> {
        let target = IMPLEMENTATION_TARGETS[self.variant_index % IMPLEMENTATION_TARGETS.len()];
        let score = round_to(0.72 + self.rng.random::<f64>() * 0.25, 3);
        let unit = TestResult::new(
            "unit::orchestrator::planner",
            true,
            420.0 + self.rng.random::<f64>() * 40.0,
            "Planner decomposition checks passed.",
        )
        .with_coverage(0.88);
        let property = TestResult::new(
            "property::tournament::score_ordering",
            true,
            390.0 + self.rng.random::<f64>() * 50.0,
            "Score ordering stayed stable under generated inputs.",
        );
        let lines_of_code = 3200 + self.rng.random_range(-200..=200i32);
        let latency_ms = 280 + self.rng.random_range(-30..=30i32);

        let node = VersionNode::new(
            ctx.ids.new_id(self.role().node_prefix()),
            format!("Implementation Variant {}", self.variant()),
        )
        .with_parent(ctx.target)
        .with_summary(format!(
            "Implements {target} behind the quality gates.\n- Tests-first scaffolding\n\
             - Streaming progress events\n- Policy guard integration"
        ))
        .with_status(NodeStatus::Running)
        .with_score(score)
        .with_cost(4.20)
        .with_metric(metric::TEST_PASS_RATE, 0.95)
        .with_metric(metric::LINES_OF_CODE, f64::from(lines_of_code))
        .with_metric(metric::LATENCY_MS, f64::from(latency_ms))
        .with_test(unit)
        .with_test(property)
        .with_variant(self.variant());
        tracing::debug!("{} targets {}", self.name, target);
        Ok(vec![node])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use rand::SeedableRng;
    use tourney_graph::IdFactory;
    use tourney_policy::Mode;

    #[test]
    fn coder_node_shape() {
        let ids = IdFactory::new();
        let config = RunConfig::new("t", Mode::Power);
        let ctx = AgentContext::new(&ids, &config).with_target(Some("arch-2"));

        for index in 0..8 {
            let mut coder = Coder::new(index, StdRng::seed_from_u64(index as u64));
            let node = coder.run(&mut VersionGraph::new(), &ctx).unwrap().remove(0);

            assert_eq!(node.parent_id(), Some("arch-2"));
            assert_eq!(node.status(), NodeStatus::Running);
            assert_eq!(node.variant(), index as u32 + 1);
            assert!((0.72..=0.97).contains(&node.score()));
            assert_eq!(node.tests().len(), 2);
            assert!(node
                .summary()
                .contains(IMPLEMENTATION_TARGETS[index % IMPLEMENTATION_TARGETS.len()]));
            let loc = node.metric(metric::LINES_OF_CODE).unwrap();
            assert!((3000.0..=3400.0).contains(&loc));
            let latency = node.metric(metric::LATENCY_MS).unwrap();
            assert!((250.0..=310.0).contains(&latency));
        }
    }

    #[test]
    fn parentless_without_architecture() {
        let ids = IdFactory::new();
        let config = RunConfig::new("t", Mode::Power);
        let mut coder = Coder::new(0, StdRng::seed_from_u64(1));
        let node = coder
            .run(&mut VersionGraph::new(), &AgentContext::new(&ids, &config))
            .unwrap()
            .remove(0);
        assert_eq!(node.parent_id(), None);
    }
}
