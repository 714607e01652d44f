//! Testing utilities for the Tourney workspace
//!
//! Shared fixtures for integration tests: recorded sessions, failing agents
//! and timestamp-free graph views.

#![allow(missing_docs)]

use serde_json::Value;
use tourney_core::{
    Agent, AgentContext, AgentError, AgentRole, AgentSet, EventEmitter, EventKind, MemorySink,
    PipelineSettings, RunConfig, Session, SessionError, SessionReport,
};
use tourney_graph::{VersionGraph, VersionNode};
use tourney_policy::Mode;

pub fn power_config(variant_count: u32, seed: u64) -> RunConfig {
    RunConfig::new("Design a tournament search service", Mode::Power)
        .with_variant_count(variant_count)
        .with_seed(seed)
}

pub fn recording_emitter(session_id: &str) -> (EventEmitter, MemorySink) {
    let sink = MemorySink::new();
    (EventEmitter::new(session_id, sink.clone()), sink)
}

/// Run a session against an in-memory sink
pub fn run_recorded(
    session: &Session,
    config: RunConfig,
) -> (Result<SessionReport, SessionError>, MemorySink) {
    let (emitter, sink) = recording_emitter("test-session");
    (session.run(config, &emitter), sink)
}

pub fn count_kind(sink: &MemorySink, kind: EventKind) -> usize {
    sink.kinds().into_iter().filter(|k| *k == kind).count()
}

pub fn scored_node(id: &str, score: f64, coverage: f64, latency_ms: f64) -> VersionNode {
    VersionNode::new(id, id)
        .with_score(score)
        .with_metric("coverage", coverage)
        .with_metric("latencyMs", latency_ms)
}

/// Node values with ids and timestamps removed, in insertion order
///
/// Ids are left out because parallel runs may number nodes differently.
pub fn node_values(graph: &VersionGraph) -> Vec<Value> {
    graph
        .nodes()
        .iter()
        .map(|node| {
            let mut value = serde_json::to_value(node).unwrap();
            let fields = value.as_object_mut().unwrap();
            fields.remove("createdAt");
            fields.remove("id");
            fields.remove("parentId");
            value
        })
        .collect()
}

/// Graph serialized without timestamps
pub fn without_timestamps(graph: &VersionGraph) -> Value {
    let mut value = serde_json::to_value(graph).unwrap();
    for node in value["nodes"].as_array_mut().unwrap() {
        node.as_object_mut().unwrap().remove("createdAt");
    }
    value
}

/// Agent that fails every time it runs
#[derive(Debug)]
pub struct FailingAgent {
    role: AgentRole,
    name: String,
}

impl FailingAgent {
    pub fn new(role: AgentRole) -> Self {
        Self {
            role,
            name: format!("failing-{role}"),
        }
    }
}

impl Agent for FailingAgent {
    fn role(&self) -> AgentRole {
        self.role
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn run(
        &mut self,
        _graph: &mut VersionGraph,
        _ctx: &AgentContext<'_>,
    ) -> Result<Vec<VersionNode>, AgentError> {
        Err(AgentError::failed(&self.name, "injected failure"))
    }
}

/// Standard roster whose last tester fails
pub fn roster_with_failing_tester(config: &RunConfig, seed: u64, settings: &PipelineSettings) -> AgentSet {
    let mut agents = AgentSet::standard(config, seed, settings);
    if let Some(chain) = agents.chains.last_mut() {
        chain.tester = Box::new(FailingAgent::new(AgentRole::Tester));
    }
    agents
}

/// Standard roster whose planner fails
pub fn roster_with_failing_planner(config: &RunConfig, seed: u64, settings: &PipelineSettings) -> AgentSet {
    let mut agents = AgentSet::standard(config, seed, settings);
    agents.planner = Box::new(FailingAgent::new(AgentRole::Planner));
    agents
}

/// Agent that succeeds without producing anything
#[derive(Debug)]
pub struct SilentAgent {
    role: AgentRole,
}

impl SilentAgent {
    pub fn new(role: AgentRole) -> Self {
        Self { role }
    }
}

impl Agent for SilentAgent {
    fn role(&self) -> AgentRole {
        self.role
    }

    fn name(&self) -> &str {
        "silent"
    }

    fn run(
        &mut self,
        _graph: &mut VersionGraph,
        _ctx: &AgentContext<'_>,
    ) -> Result<Vec<VersionNode>, AgentError> {
        Ok(Vec::new())
    }
}

/// Standard roster whose planner returns no node
pub fn roster_with_silent_planner(config: &RunConfig, seed: u64, settings: &PipelineSettings) -> AgentSet {
    let mut agents = AgentSet::standard(config, seed, settings);
    agents.planner = Box::new(SilentAgent::new(AgentRole::Planner));
    agents
}

/// Insertion position of each node's parent
///
/// Compares topology across runs whose ids are numbered differently.
pub fn parent_positions(graph: &VersionGraph) -> Vec<Option<usize>> {
    let nodes = graph.nodes();
    nodes
        .iter()
        .map(|node| {
            node.parent_id()
                .and_then(|parent| nodes.iter().position(|n| n.id() == parent))
        })
        .collect()
}
