//! Pipeline agents
//!
//! One capability interface, [`Agent`], with six concrete roles. Agents that
//! create nodes return them without inserting; the runner adds them and wires
//! edges. Review agents ([`Tester`], [`SecurityReviewer`]) annotate their
//! target in place through [`VersionGraph::update_node`] and return the
//! updated copy.

mod architect;
mod coder;
mod docs;
mod planner;
mod security;
mod tester;

pub use architect::{Architect, ARCHITECTURE_STRATEGIES};
pub use coder::{Coder, IMPLEMENTATION_TARGETS};
pub use docs::DocumentationWriter;
pub use planner::{Planner, PLAN_DELIVERABLES};
pub use security::{SecurityReviewer, SECURITY_NOTE};
pub use tester::Tester;

use crate::config::{PipelineSettings, RunConfig};
use crate::error::AgentError;
use crate::seed::{instance_rng, SeedRole};
use serde::{Deserialize, Serialize};
use std::fmt;
use tourney_graph::{IdFactory, VersionGraph, VersionNode};

/// Metric keys written by the agents and read by the evaluator
pub mod metric {
    /// Planner specification depth
    pub const SPEC_DEPTH: &str = "specDepth";
    /// Planner risk register size
    pub const RISK_ITEMS: &str = "riskItems";
    /// Architect design risk
    pub const DESIGN_RISK: &str = "designRisk";
    /// Architect latency budget
    pub const LATENCY_BUDGET_MS: &str = "latencyBudgetMs";
    /// Coder test pass rate
    pub const TEST_PASS_RATE: &str = "testPassRate";
    /// Coder size estimate
    pub const LINES_OF_CODE: &str = "linesOfCode";
    /// Coder measured latency
    pub const LATENCY_MS: &str = "latencyMs";
    /// Tester flake rate
    pub const FLAKE_RATE: &str = "flakeRate";
    /// Tester coverage
    pub const COVERAGE: &str = "coverage";
    /// Security static analysis findings
    pub const SEMGREP_FINDINGS: &str = "semgrepFindings";
    /// Security vulnerable dependencies
    pub const DEPENDENCY_VULNS: &str = "dependencyVulns";
    /// Security leaked secrets
    pub const SECRETS_FOUND: &str = "secretsFound";
    /// Documentation completeness
    pub const DOC_COMPLETENESS: &str = "docCompleteness";
}

/// Pipeline role of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Produces the root plan
    Planner,
    /// Produces architecture alternatives
    Architect,
    /// Produces implementation variants
    Coder,
    /// Verifies a variant in place
    Tester,
    /// Reviews a variant in place
    SecurityReviewer,
    /// Documents a variant
    DocumentationWriter,
}

impl AgentRole {
    /// Identifier prefix of nodes created by this role
    #[inline]
    #[must_use]
    pub fn node_prefix(&self) -> &'static str {
        match self {
            AgentRole::Planner => "plan",
            AgentRole::Architect => "arch",
            AgentRole::Coder => "code",
            AgentRole::Tester => "test",
            AgentRole::SecurityReviewer => "security",
            AgentRole::DocumentationWriter => "docs",
        }
    }

    /// Whether this role annotates an existing node instead of creating one
    #[inline]
    #[must_use]
    pub fn mutates_in_place(&self) -> bool {
        matches!(self, AgentRole::Tester | AgentRole::SecurityReviewer)
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AgentRole::Planner => "planner",
            AgentRole::Architect => "architect",
            AgentRole::Coder => "coder",
            AgentRole::Tester => "tester",
            AgentRole::SecurityReviewer => "security",
            AgentRole::DocumentationWriter => "docs",
        };
        f.write_str(name)
    }
}

/// What an agent sees besides the graph
///
/// `target` is the node the agent works from: the plan for architects, the
/// architecture for coders, the variant for review and documentation agents.
#[derive(Debug, Clone, Copy)]
pub struct AgentContext<'a> {
    /// Shared identifier source of the run
    pub ids: &'a IdFactory,
    /// The run request
    pub config: &'a RunConfig,
    /// Node the agent works from
    pub target: Option<&'a str>,
}

impl<'a> AgentContext<'a> {
    /// Context without a target
    #[inline]
    #[must_use]
    pub fn new(ids: &'a IdFactory, config: &'a RunConfig) -> Self {
        Self {
            ids,
            config,
            target: None,
        }
    }

    /// Same context aimed at another node
    #[inline]
    #[must_use]
    pub fn with_target(self, target: Option<&'a str>) -> Self {
        Self { target, ..self }
    }
}

/// A unit of pipeline work
pub trait Agent: Send + fmt::Debug {
    /// Pipeline role
    fn role(&self) -> AgentRole;

    /// Instance name used in logs and errors
    fn name(&self) -> &str;

    /// Run the agent once
    ///
    /// Creating roles return new nodes that are not yet in `graph`. In-place
    /// roles return the updated target, or nothing when the target is absent.
    ///
    /// # Errors
    /// `AgentError::Failed` aborts the whole run.
    fn run(
        &mut self,
        graph: &mut VersionGraph,
        ctx: &AgentContext<'_>,
    ) -> Result<Vec<VersionNode>, AgentError>;
}

/// Agents of one implementation variant
#[derive(Debug)]
pub struct VariantChain {
    /// Produces the variant
    pub coder: Box<dyn Agent>,
    /// Verifies it
    pub tester: Box<dyn Agent>,
    /// Reviews it
    pub security: Box<dyn Agent>,
    /// Documents it
    pub docs: Box<dyn Agent>,
}

impl VariantChain {
    /// Standard chain for variant `index`
    #[must_use]
    pub fn standard(seed: u64, index: usize) -> Self {
        let i = index as u64;
        Self {
            coder: Box::new(Coder::new(index, instance_rng(seed, SeedRole::Coder, i))),
            tester: Box::new(Tester::new(index, instance_rng(seed, SeedRole::Tester, i))),
            security: Box::new(SecurityReviewer::new(
                index,
                instance_rng(seed, SeedRole::Security, i),
            )),
            docs: Box::new(DocumentationWriter::new(index)),
        }
    }
}

/// Every agent instance of one run
#[derive(Debug)]
pub struct AgentSet {
    /// Root planner
    pub planner: Box<dyn Agent>,
    /// Architecture alternatives, in execution order
    pub architects: Vec<Box<dyn Agent>>,
    /// One chain per variant, in variant order
    pub chains: Vec<VariantChain>,
}

impl AgentSet {
    /// Standard roster for a run
    #[must_use]
    pub fn standard(config: &RunConfig, seed: u64, settings: &PipelineSettings) -> Self {
        let architects = (0..settings.architect_count(config.variant_count))
            .map(|i| {
                Box::new(Architect::new(i, instance_rng(seed, SeedRole::Architect, i as u64)))
                    as Box<dyn Agent>
            })
            .collect();
        let chains = (0..config.variant_count as usize)
            .map(|i| VariantChain::standard(seed, i))
            .collect();
        Self {
            planner: Box::new(Planner::new()),
            architects,
            chains,
        }
    }
}
