//! Staged pipeline runner
//!
//! Fixed stage order:
//!
//! ```text
//! Plan -> Architect (xk) -> [Code -> Test -> SecurityReview -> Document] (x variantCount)
//! ```
//!
//! The runner owns the identifier factory of the run, inserts every created
//! node, and wires edges only from an existing node to a node it has just
//! inserted, so the graph stays acyclic by construction. Events are recorded
//! in [`PipelineOutcome::events`] and, when an emitter is given, streamed as
//! they happen. Any agent error aborts the run.

use crate::agents::{Agent, AgentContext, AgentSet, VariantChain};
use crate::config::{ChainExecution, PipelineSettings, RunConfig};
use crate::error::{AgentError, EmitError, SessionError};
use crate::events::{EventEmitter, EventPayload, MetricSample};
use crate::seed::{instance_rng, round_to, SeedRole};
use rand::seq::IndexedRandom;
use rayon::prelude::*;
use tourney_graph::{IdFactory, VersionGraph, VersionNode};

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Completed graph
    pub graph: VersionGraph,
    /// Every event produced, in order
    pub events: Vec<EventPayload>,
}

/// Runs the staged pipeline for one request
#[derive(Debug)]
pub struct PipelineRunner {
    config: RunConfig,
    seed: u64,
    settings: PipelineSettings,
    ids: IdFactory,
}

impl PipelineRunner {
    /// Runner for a request with an already resolved seed
    #[must_use]
    pub fn new(config: RunConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            settings: PipelineSettings::default(),
            ids: IdFactory::new(),
        }
    }

    /// Set runner settings
    #[inline]
    #[must_use]
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The request
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The resolved seed
    #[inline]
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Runner settings
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Identifier factory of the run
    #[inline]
    #[must_use]
    pub fn ids(&self) -> &IdFactory {
        &self.ids
    }

    /// Standard agent roster for this run
    #[must_use]
    pub fn standard_agents(&self) -> AgentSet {
        AgentSet::standard(&self.config, self.seed, &self.settings)
    }

    /// Run with the standard roster, recording events only
    ///
    /// # Errors
    /// Same as [`PipelineRunner::run_with`].
    pub fn run(&self) -> Result<PipelineOutcome, SessionError> {
        self.run_with(self.standard_agents(), None)
    }

    /// Run a roster, streaming events to `emitter` when given
    ///
    /// # Errors
    /// - `SessionError::Agent` if any agent fails; nothing after it runs
    /// - `SessionError::Graph` if an agent returns a node id already in use
    /// - `SessionError::Emit` if the emitter's sink fails
    pub fn run_with(
        &self,
        mut agents: AgentSet,
        emitter: Option<&EventEmitter>,
    ) -> Result<PipelineOutcome, SessionError> {
        tracing::info!(
            "Starting pipeline: {} variants, {} architects, seed {}",
            agents.chains.len(),
            agents.architects.len(),
            self.seed
        );
        let ctx = AgentContext::new(&self.ids, &self.config);
        let mut graph = VersionGraph::new();
        let mut trace = Trace::new(emitter);

        // Plan
        tracing::info!("Pipeline stage: plan");
        let mut plan_id = None;
        for node in invoke(agents.planner.as_mut(), &mut graph, ctx)? {
            let id = node.id().to_string();
            let title = node.title().to_string();
            graph.add_node(node)?;
            trace.push(EventPayload::log(&id, format!("Planner produced {title}")))?;
            if plan_id.is_none() {
                plan_id = Some(id);
            }
        }
        trace.push(EventPayload::graph(&graph))?;

        // Architect
        tracing::info!("Pipeline stage: architect");
        let mut architectures: Vec<String> = Vec::new();
        for architect in &mut agents.architects {
            let produced = invoke(architect.as_mut(), &mut graph, ctx.with_target(plan_id.as_deref()))?;
            for node in produced {
                let id = node.id().to_string();
                let title = node.title().to_string();
                graph.add_node(node)?;
                if let Some(plan) = plan_id.as_deref() {
                    graph.connect(&self.ids, plan, &id)?;
                }
                trace.push(EventPayload::log(&id, format!("Architect strategy: {title}")))?;
                architectures.push(id);
            }
        }
        trace.push(EventPayload::graph(&graph))?;

        // Variant chains
        let mut picker = instance_rng(self.seed, SeedRole::Runner, 0);
        let parents: Vec<Option<String>> = agents
            .chains
            .iter()
            .map(|_| architectures.choose(&mut picker).cloned())
            .collect();

        match self.settings.chain_execution {
            ChainExecution::Sequential => {
                tracing::info!("Pipeline stage: variants ({} sequential)", parents.len());
                for (chain, parent) in agents.chains.iter_mut().zip(&parents) {
                    let logs = run_chain(&mut graph, chain, parent.as_deref(), ctx)?;
                    trace.extend(logs)?;
                    trace.push(EventPayload::graph(&graph))?;
                }
            }
            ChainExecution::Parallel => {
                tracing::info!("Pipeline stage: variants ({} parallel)", parents.len());
                let finished: Vec<(VersionGraph, Vec<EventPayload>)> = agents
                    .chains
                    .par_iter_mut()
                    .zip(parents.par_iter())
                    .map(|(chain, parent)| -> Result<_, SessionError> {
                        let mut scratch = VersionGraph::new();
                        if let Some(anchor) = parent.as_deref().and_then(|id| graph.get_node(id)) {
                            scratch.add_node(anchor.clone())?;
                        }
                        let logs = run_chain(&mut scratch, chain, parent.as_deref(), ctx)?;
                        Ok((scratch, logs))
                    })
                    .collect::<Result<_, SessionError>>()?;

                for (scratch, logs) in finished {
                    graph.extend_from(scratch)?;
                    trace.extend(logs)?;
                }
                trace.push(EventPayload::graph(&graph))?;
            }
        }

        trace.push(run_summary(&graph))?;
        tracing::info!(
            "Pipeline finished: {} nodes, {} edges",
            graph.len(),
            graph.edge_count()
        );
        Ok(PipelineOutcome {
            graph,
            events: trace.events,
        })
    }
}

/// Code, test, review and document one variant
fn run_chain(
    graph: &mut VersionGraph,
    chain: &mut VariantChain,
    architecture: Option<&str>,
    ctx: AgentContext<'_>,
) -> Result<Vec<EventPayload>, SessionError> {
    let mut logs = Vec::new();
    for node in invoke(chain.coder.as_mut(), graph, ctx.with_target(architecture))? {
        let id = node.id().to_string();
        let variant = node.variant();
        graph.add_node(node)?;
        if let Some(parent) = architecture {
            graph.connect(ctx.ids, parent, &id)?;
        }
        logs.push(EventPayload::log(&id, format!("Coder variant {variant} executing tests")));

        let on_variant = ctx.with_target(Some(&id));
        if !invoke(chain.tester.as_mut(), graph, on_variant)?.is_empty() {
            logs.push(EventPayload::log(&id, "Quality checks passed"));
        }
        if !invoke(chain.security.as_mut(), graph, on_variant)?.is_empty() {
            logs.push(EventPayload::log(&id, "Security review complete"));
        }
        for doc in invoke(chain.docs.as_mut(), graph, on_variant)? {
            let doc_id = doc.id().to_string();
            graph.add_node(doc)?;
            graph.connect(ctx.ids, &id, &doc_id)?;
            logs.push(EventPayload::log(&doc_id, "Documentation emitted."));
        }
    }
    Ok(logs)
}

fn invoke(
    agent: &mut dyn Agent,
    graph: &mut VersionGraph,
    ctx: AgentContext<'_>,
) -> Result<Vec<VersionNode>, AgentError> {
    tracing::debug!("Running {} ({}) on {:?}", agent.name(), agent.role(), ctx.target);
    agent.run(graph, &ctx).map_err(|err| {
        tracing::error!("Agent {} failed, aborting run: {}", agent.name(), err);
        err
    })
}

/// Summary observations over the final graph
fn run_summary(graph: &VersionGraph) -> EventPayload {
    let nodes = graph.nodes();
    let total_cost: f64 = nodes.iter().map(VersionNode::cost_usd).sum();
    let average_score = if nodes.is_empty() {
        0.0
    } else {
        nodes.iter().map(VersionNode::score).sum::<f64>() / nodes.len() as f64
    };
    EventPayload::Metric(vec![
        MetricSample::new("nodeCount", graph.len() as f64),
        MetricSample::new("edgeCount", graph.edge_count() as f64),
        MetricSample::new("averageScore", round_to(average_score, 4)),
        MetricSample::new("totalCostUsd", round_to(total_cost, 2)).with_unit("USD"),
    ])
}

struct Trace<'e> {
    events: Vec<EventPayload>,
    emitter: Option<&'e EventEmitter>,
}

impl<'e> Trace<'e> {
    fn new(emitter: Option<&'e EventEmitter>) -> Self {
        Self {
            events: Vec::new(),
            emitter,
        }
    }

    fn push(&mut self, payload: EventPayload) -> Result<(), EmitError> {
        if let Some(emitter) = self.emitter {
            emitter.emit(payload.clone())?;
        }
        self.events.push(payload);
        Ok(())
    }

    fn extend(&mut self, payloads: Vec<EventPayload>) -> Result<(), EmitError> {
        payloads.into_iter().try_for_each(|payload| self.push(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventKind, LogEntry};
    use pretty_assertions::assert_eq;
    use tourney_policy::Mode;

    fn runner(variants: u32, seed: u64) -> PipelineRunner {
        PipelineRunner::new(
            RunConfig::new("Build a tournament", Mode::Power).with_variant_count(variants),
            seed,
        )
    }

    fn kinds(events: &[EventPayload]) -> Vec<EventKind> {
        events.iter().map(EventPayload::kind).collect()
    }

    #[test]
    fn single_variant_event_order() {
        let outcome = runner(1, 11).run().unwrap();
        use EventKind::{GraphUpdate as G, Log as L, Metric as M};
        assert_eq!(
            kinds(&outcome.events),
            vec![L, G, L, G, L, L, L, L, G, M],
            "plan, architect, coder/tester/security/docs, summary"
        );
    }

    #[test]
    fn graph_shape() {
        let outcome = runner(4, 3).run().unwrap();
        let graph = &outcome.graph;
        // plan + 3 architects + 4 coders + 4 docs
        assert_eq!(graph.len(), 12);
        assert_eq!(graph.edge_count(), 11);
        assert_eq!(graph.roots().len(), 1);
        assert!(graph.is_acyclic());

        let plan = graph.roots()[0].id().to_string();
        let architectures = graph.children(&plan);
        assert_eq!(architectures.len(), 3);
    }

    #[test]
    fn every_edge_parent_matches_child() {
        let outcome = runner(3, 8).run().unwrap();
        for edge in outcome.graph.edges() {
            let child = outcome.graph.get_node(&edge.target).unwrap();
            assert_eq!(child.parent_id(), Some(edge.source.as_str()));
        }
    }

    #[test]
    fn logs_refer_to_present_nodes() {
        let outcome = runner(2, 5).run().unwrap();
        for event in &outcome.events {
            if let EventPayload::Log(LogEntry { version_id: Some(id), .. }) = event {
                assert!(outcome.graph.contains(id), "{id}");
            }
        }
    }

    #[test]
    fn summary_metric_counts_graph() {
        let outcome = runner(2, 5).run().unwrap();
        let Some(EventPayload::Metric(samples)) = outcome.events.last() else {
            panic!("last event is not the summary metric");
        };
        let names: Vec<&str> = samples.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["nodeCount", "edgeCount", "averageScore", "totalCostUsd"]);
        assert_eq!(samples[0].value, outcome.graph.len() as f64);
        assert_eq!(samples[3].unit.as_deref(), Some("USD"));
    }

    #[test]
    fn coders_are_parentless_without_architectures() {
        for execution in [ChainExecution::Sequential, ChainExecution::Parallel] {
            let settings = PipelineSettings::default()
                .with_max_architects(0)
                .with_chain_execution(execution);
            let outcome = runner(2, 6).with_settings(settings).run().unwrap();
            let graph = &outcome.graph;

            let coders: Vec<&VersionNode> =
                graph.nodes().iter().filter(|n| n.id().starts_with("code-")).collect();
            assert_eq!(coders.len(), 2);
            assert!(coders.iter().all(|n| n.parent_id().is_none()));
            assert!(!graph.nodes().iter().any(|n| n.id().starts_with("arch-")));

            // Only coder -> docs edges remain
            assert_eq!(graph.edge_count(), 2);
            for edge in graph.edges() {
                assert!(edge.source.starts_with("code-"), "{}", edge.source);
                assert!(edge.target.starts_with("docs-"), "{}", edge.target);
            }
            assert_eq!(graph.roots().len(), 3);
            assert!(graph.is_acyclic());
        }
    }

    #[test]
    fn parallel_chains_emit_one_batch_snapshot() {
        let settings = PipelineSettings::default().with_chain_execution(ChainExecution::Parallel);
        let outcome = runner(4, 21).with_settings(settings).run().unwrap();
        let snapshots = outcome
            .events
            .iter()
            .filter(|e| e.kind() == EventKind::GraphUpdate)
            .count();
        assert_eq!(snapshots, 3);
        assert_eq!(outcome.graph.len(), 12);
        assert!(outcome.graph.is_acyclic());
    }

    #[test]
    fn streaming_matches_recorded() {
        let sink = crate::events::MemorySink::new();
        let emitter = EventEmitter::new("s", sink.clone());
        let runner = runner(2, 4);
        let outcome = runner
            .run_with(runner.standard_agents(), Some(&emitter))
            .unwrap();
        let streamed: Vec<EventPayload> = sink.events().into_iter().map(|e| e.payload).collect();
        assert_eq!(streamed, outcome.events);
    }
}
