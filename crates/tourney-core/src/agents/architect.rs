//! Architecture alternatives

use super::{metric, Agent, AgentContext, AgentRole};
use crate::error::AgentError;
use crate::seed::round_to;
use rand::rngs::StdRng;
use rand::Rng;
use tourney_graph::{NodeStatus, VersionGraph, VersionNode};

/// Strategies an architect picks from
pub const ARCHITECTURE_STRATEGIES: [&str; 4] = [
    "Modal-first compute + Pinecone memory",
    "Edge orchestration with Supabase streaming",
    "GPU-accelerated tournament on Modal",
    "Hybrid offline/online evaluation",
];

/// Produces one architecture node per run, parented to the plan
#[derive(Debug)]
pub struct Architect {
    name: String,
    rng: StdRng,
}

impl Architect {
    /// Create architect number `index`
    #[must_use]
    pub fn new(index: usize, rng: StdRng) -> Self {
        Self {
            name: format!("architect-{index}"),
            rng,
        }
    }
}

impl Agent for Architect {
    fn role(&self) -> AgentRole {
        AgentRole::Architect
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn run(
        &mut self,
        _graph: &mut VersionGraph,
        ctx: &AgentContext<'_>,
    ) -> Result<Vec<VersionNode>, AgentError> {
        let strategy = ARCHITECTURE_STRATEGIES[self.rng.random_range(0..ARCHITECTURE_STRATEGIES.len())];
        let score = round_to(0.65 + self.rng.random::<f64>() * 0.2, 3);
        let design_risk = self.rng.random_range(0.1..=0.3);
        let variant = self.rng.random_range(1..=3u32);

        let headline = strategy.split_whitespace().next().unwrap_or(strategy);
        let summary = format!(
            "Strategy: {strategy}\nKey components:\n- Planner agent with dependency graph\n- \
             Modal sandbox for code execution\n- Tournament search with {} variants",
            ctx.config.variant_count
        );

        let node = VersionNode::new(
            ctx.ids.new_id(self.role().node_prefix()),
            format!("Architecture: {headline}"),
        )
        .with_parent(ctx.target)
        .with_summary(summary)
        .with_status(NodeStatus::Succeeded)
        .with_score(score)
        .with_cost(2.40)
        .with_metric(metric::DESIGN_RISK, design_risk)
        .with_metric(metric::LATENCY_BUDGET_MS, 400.0)
        .with_variant(variant);
        tracing::debug!("{} chose strategy {:?}", self.name, strategy);
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

    fn run_once(seed: u64) -> VersionNode {
        let ids = IdFactory::new();
        let config = RunConfig::new("t", Mode::Power).with_variant_count(4);
        let ctx = AgentContext::new(&ids, &config).with_target(Some("plan-1"));
        let mut architect = Architect::new(0, StdRng::seed_from_u64(seed));
        architect.run(&mut VersionGraph::new(), &ctx).unwrap().remove(0)
    }

    #[test]
    fn architect_values_in_range() {
        for seed in 0..50 {
            let node = run_once(seed);
            assert_eq!(node.parent_id(), Some("plan-1"));
            assert!((0.65..=0.85).contains(&node.score()), "{}", node.score());
            assert!((1..=3).contains(&node.variant()));
            let risk = node.metric(metric::DESIGN_RISK).unwrap();
            assert!((0.1..=0.3).contains(&risk));
            assert!(node.title().starts_with("Architecture: "));
            assert!(node.summary().ends_with("Tournament search with 4 variants"));
        }
    }

    #[test]
    fn same_seed_same_node() {
        let a = run_once(9);
        let b = run_once(9);
        assert_eq!(a.title(), b.title());
        assert_eq!(a.score(), b.score());
        assert_eq!(a.metrics(), b.metrics());
        assert_eq!(a.variant(), b.variant());
    }
}
