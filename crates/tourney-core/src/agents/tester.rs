//! In-place verification of a variant

use super::{metric, Agent, AgentContext, AgentRole};
use crate::error::AgentError;
use rand::rngs::StdRng;
use rand::Rng;
use tourney_graph::{NodeStatus, TestResult, VersionGraph, VersionNode};

/// Marks its target succeeded and records flake rate, coverage and a fuzz run
#[derive(Debug)]
pub struct Tester {
    name: String,
    rng: StdRng,
}

impl Tester {
    /// Create the tester of variant `index`
    #[must_use]
    pub fn new(index: usize, rng: StdRng) -> Self {
        Self {
            name: format!("tester-{index}"),
            rng,
        }
    }
}

impl Agent for Tester {
    fn role(&self) -> AgentRole {
        AgentRole::Tester
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn run(
        &mut self,
        graph: &mut VersionGraph,
        ctx: &AgentContext<'_>,
    ) -> Result<Vec<VersionNode>, AgentError> {
        let Some(target) = ctx.target.filter(|id| graph.contains(id)) else {
            tracing::warn!("{}: target {:?} not in graph, skipping", self.name, ctx.target);
            return Ok(Vec::new());
        };

        let flake_rate = self.rng.random_range(0.0..0.05);
        let coverage = 0.9 + self.rng.random_range(0.0..0.05);
        let updated = graph.update_node(target, |node| {
            node.set_status(NodeStatus::Succeeded);
            node.merge_metrics([(metric::FLAKE_RATE, flake_rate), (metric::COVERAGE, coverage)]);
            node.push_test(TestResult::new(
                "fuzz::executor::safety",
                true,
                680.0,
                "Fuzz run executed 12,000 iterations without crashes.",
            ));
            node.clone()
        });
        Ok(updated.into_iter().collect())
    }
}
