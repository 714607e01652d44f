//! Documentation node per variant

use super::{metric, Agent, AgentContext, AgentRole};
use crate::error::AgentError;
use tourney_graph::{NodeStatus, VersionGraph, VersionNode};

/// Produces the terminal documentation node of a variant
#[derive(Debug, Clone)]
pub struct DocumentationWriter {
    name: String,
}

impl DocumentationWriter {
    /// Create the writer of variant `index`
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self {
            name: format!("docs-{index}"),
        }
    }
}

impl Agent for DocumentationWriter {
    fn role(&self) -> AgentRole {
        AgentRole::DocumentationWriter
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn run(
        &mut self,
        _graph: &mut VersionGraph,
        ctx: &AgentContext<'_>,
    ) -> Result<Vec<VersionNode>, AgentError> {
        let node = VersionNode::new(ctx.ids.new_id(self.role().node_prefix()), "Documentation Suite")
            .with_parent(ctx.target)
            .with_summary(
                "Generated README, API docs, and architecture diagrams.\n\
                 Highlights environment setup, policy guard, and tournament evaluation pipeline.",
            )
            .with_status(NodeStatus::Succeeded)
            .with_score(0.81)
            .with_cost(1.10)
            .with_metric(metric::DOC_COMPLETENESS, 0.95);
        Ok(vec![node])
    }
}
