//! Root planner

use super::{metric, Agent, AgentContext, AgentRole};
use crate::error::AgentError;
use tourney_graph::{NodeStatus, TestResult, VersionGraph, VersionNode};

/// Deliverables every plan covers
pub const PLAN_DELIVERABLES: [&str; 5] = [
    "Comprehensive requirement brief",
    "Architecture alternatives",
    "Tournament execution plan",
    "Quality and security gates",
    "Risk and mitigation log",
];

/// Produces the single root node of a run. Output is fully deterministic.
#[derive(Debug, Clone, Default)]
pub struct Planner;

impl Planner {
    /// Create a planner
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn summary() -> String {
        let mut summary = String::from("Chief Planner deliverables:");
        for item in PLAN_DELIVERABLES {
            summary.push_str("\n- ");
            summary.push_str(item);
        }
        summary
    }
}

impl Agent for Planner {
    fn role(&self) -> AgentRole {
        AgentRole::Planner
    }

    fn name(&self) -> &str {
        "planner"
    }

    fn run(
        &mut self,
        _graph: &mut VersionGraph,
        ctx: &AgentContext<'_>,
    ) -> Result<Vec<VersionNode>, AgentError> {
        let node = VersionNode::new(ctx.ids.new_id(self.role().node_prefix()), "Master Plan")
            .with_summary(Self::summary())
            .with_status(NodeStatus::Succeeded)
            .with_score(0.75)
            .with_cost(1.80)
            .with_metric(metric::SPEC_DEPTH, 5.0)
            .with_metric(metric::RISK_ITEMS, 8.0)
            .with_test(
                TestResult::new(
                    "Specification coverage",
                    true,
                    120.0,
                    "Verified that plan covers architecture, testing, and safety gates.",
                )
                .with_coverage(0.92),
            );
        tracing::debug!("Planner produced {}", node.id());
        Ok(vec![node])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use tourney_graph::IdFactory;
    use tourney_policy::Mode;

    #[test]
    fn planner_produces_one_root() {
        let ids = IdFactory::new();
        let config = RunConfig::new("t", Mode::Power);
        let mut graph = VersionGraph::new();
        let nodes = Planner::new()
            .run(&mut graph, &AgentContext::new(&ids, &config))
            .unwrap();

        assert_eq!(nodes.len(), 1);
        let plan = &nodes[0];
        assert_eq!(plan.id(), "plan-1");
        assert_eq!(plan.parent_id(), None);
        assert_eq!(plan.variant(), 0);
        assert_eq!(plan.metric(metric::SPEC_DEPTH), Some(5.0));
        assert_eq!(plan.metric(metric::RISK_ITEMS), Some(8.0));
        assert_eq!(plan.tests().len(), 1);
        assert!(plan.tests()[0].passed);
        assert!(plan.summary().starts_with("Chief Planner deliverables:\n- "));
        assert!(graph.is_empty(), "planner does not insert");
    }
}
