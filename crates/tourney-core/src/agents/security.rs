//! In-place security review of a variant

use super::{metric, Agent, AgentContext, AgentRole};
use crate::error::AgentError;
use rand::rngs::StdRng;
use rand::Rng;
use tourney_graph::{VersionGraph, VersionNode};

/// Note appended to a reviewed node's summary
pub const SECURITY_NOTE: &str = "\n\nSecurity review: No critical findings.";

/// Records static analysis and dependency audit results on its target
#[derive(Debug)]
pub struct SecurityReviewer {
    name: String,
    rng: StdRng,
}

impl SecurityReviewer {
    /// Create the reviewer of variant `index`
    #[must_use]
    pub fn new(index: usize, rng: StdRng) -> Self {
        Self {
            name: format!("security-{index}"),
            rng,
        }
    }
}

impl Agent for SecurityReviewer {
    fn role(&self) -> AgentRole {
        AgentRole::SecurityReviewer
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

        let findings = self.rng.random_range(0..=1u32);
        let updated = graph.update_node(target, |node| {
            node.merge_metrics([
                (metric::SEMGREP_FINDINGS, f64::from(findings)),
                (metric::DEPENDENCY_VULNS, 0.0),
                (metric::SECRETS_FOUND, 0.0),
            ]);
            node.append_summary(SECURITY_NOTE);
            node.clone()
        });
        Ok(updated.into_iter().collect())
    }
}
