//! Session entrypoint
//!
//! Sequencing of one run, no stage skipped or reordered:
//! 1. validate the request
//! 2. evaluate the policy gate and emit one `policy` event
//! 3. stop if denied
//! 4. run the pipeline, streaming its events
//! 5. rank the final graph, one `metric-update` per leaderboard entry
//! 6. emit `complete` with the top-ranked node
//!
//! Configuration errors surface before any event is written. An agent error
//! aborts the run before `complete`, so a stream without `complete` is a
//! failed run.

use crate::agents::AgentSet;
use crate::config::{PipelineSettings, RunConfig};
use crate::error::SessionError;
use crate::events::{EventEmitter, EventPayload};
use crate::pipeline::PipelineRunner;
use crate::scoring::{ScoreBreakdown, ScoreEvaluator};
use crate::seed::resolve_seed;
use serde::Serialize;
use tourney_graph::VersionGraph;
use tourney_policy::{PolicyDecision, PolicyGuard};

/// Builds the agent roster of a run from its request, seed and settings
pub type Roster = fn(&RunConfig, u64, &PipelineSettings) -> AgentSet;

/// What a finished session produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    /// Correlation id of the emitted events
    pub session_id: String,
    /// Policy gate result
    pub decision: PolicyDecision,
    /// Seed the pipeline ran with; `None` when denied
    pub seed: Option<u64>,
    /// Ranked nodes, best first
    pub leaderboard: Vec<ScoreBreakdown>,
    /// Top-ranked node
    pub best_version_id: Option<String>,
    /// Final graph; `None` when denied
    #[serde(skip)]
    pub graph: Option<VersionGraph>,
}

impl SessionReport {
    /// Whether the policy gate stopped the run
    #[inline]
    #[must_use]
    pub fn was_denied(&self) -> bool {
        !self.decision.allowed
    }
}

/// Wires policy gate, pipeline and evaluator into one run
#[derive(Debug, Clone)]
pub struct Session {
    guard: PolicyGuard,
    evaluator: ScoreEvaluator,
    settings: PipelineSettings,
    roster: Roster,
}

impl Session {
    /// Session with the standard policy table, weights and roster
    #[must_use]
    pub fn new() -> Self {
        Self {
            guard: PolicyGuard::new(),
            evaluator: ScoreEvaluator::new(),
            settings: PipelineSettings::default(),
            roster: AgentSet::standard,
        }
    }

    /// Set policy guard
    #[inline]
    #[must_use]
    pub fn with_guard(mut self, guard: PolicyGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Set evaluator
    #[inline]
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: ScoreEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Set pipeline settings
    #[inline]
    #[must_use]
    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set agent roster
    #[inline]
    #[must_use]
    pub fn with_roster(mut self, roster: Roster) -> Self {
        self.roster = roster;
        self
    }

    /// Parse a JSON run request and run it
    ///
    /// # Errors
    /// Same as [`Session::run`]; malformed JSON is a `SessionError::Config`
    pub fn run_request(&self, raw: &str, emitter: &EventEmitter) -> Result<SessionReport, SessionError> {
        let config = RunConfig::from_json(raw)?;
        self.run(config, emitter)
    }

    /// Run one request
    ///
    /// A policy denial is not an error: the report carries the decision and
    /// exactly one `policy` event was emitted.
    ///
    /// # Errors
    /// - `SessionError::Config` before any event if the request is invalid
    /// - `SessionError::Agent` or `SessionError::Graph` if the pipeline aborts
    /// - `SessionError::Emit` if the sink fails
    pub fn run(&self, config: RunConfig, emitter: &EventEmitter) -> Result<SessionReport, SessionError> {
        config.validate()?;
        let session_id = emitter.session_id().to_string();
        tracing::info!("Session {} started: {:?} in {} mode", session_id, config.task, config.mode);

        let decision = self.guard.evaluate(config.mode, &config.requested_capabilities);
        emitter.emit(EventPayload::Policy(decision.clone()))?;
        if !decision.allowed {
            tracing::warn!(
                "Session {} stopped by policy: {}",
                session_id,
                decision.reason.as_deref().unwrap_or_default()
            );
            return Ok(SessionReport {
                session_id,
                decision,
                seed: None,
                leaderboard: Vec::new(),
                best_version_id: None,
                graph: None,
            });
        }
        for warning in &decision.warnings {
            tracing::warn!("Session {}: {}", session_id, warning);
        }

        let seed = resolve_seed(config.seed);
        let runner = PipelineRunner::new(config, seed).with_settings(self.settings.clone());
        let agents = (self.roster)(runner.config(), seed, runner.settings());
        let outcome = runner.run_with(agents, Some(emitter))?;

        let leaderboard = self.evaluator.evaluate(&outcome.graph);
        for entry in &leaderboard {
            emitter.emit(EventPayload::MetricUpdate(entry.to_metric_update()))?;
        }
        let best_version_id = leaderboard.first().map(|entry| entry.node_id.clone());
        emitter.emit(EventPayload::complete(best_version_id.clone()))?;
        tracing::info!(
            "Session {} complete, best version {:?}",
            session_id,
            best_version_id
        );

        Ok(SessionReport {
            session_id,
            decision,
            seed: Some(seed),
            leaderboard,
            best_version_id,
            graph: Some(outcome.graph),
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventKind, MemorySink};
    use pretty_assertions::assert_eq;
    use tourney_policy::Mode;

    fn recorded(session_id: &str) -> (EventEmitter, MemorySink) {
        let sink = MemorySink::new();
        (EventEmitter::new(session_id, sink.clone()), sink)
    }

    #[test]
    fn denied_run_emits_only_policy() {
        let (emitter, sink) = recorded("deny");
        let config = RunConfig::new("scrape", Mode::Safe).with_capabilities(["browserless"]);
        let report = Session::new().run(config, &emitter).unwrap();

        assert!(report.was_denied());
        assert!(report.graph.is_none());
        assert_eq!(sink.kinds(), vec![EventKind::Policy]);
    }

    #[test]
    fn invalid_request_emits_nothing() {
        let (emitter, sink) = recorded("bad");
        let err = Session::new()
            .run_request(r#"{"task": "t", "mode": "SAFE", "variantCount": "x"}"#, &emitter)
            .unwrap_err();
        assert!(err.is_preflight());
        assert!(sink.is_empty());
    }

    #[test]
    fn allowed_run_ends_with_complete() {
        let (emitter, sink) = recorded("ok");
        let config = RunConfig::new("t", Mode::Guarded)
            .with_variant_count(2)
            .with_seed(7)
            .with_capabilities(["modal:python"]);
        let report = Session::new().run(config, &emitter).unwrap();

        let kinds = sink.kinds();
        assert_eq!(kinds.first(), Some(&EventKind::Policy));
        assert_eq!(kinds.last(), Some(&EventKind::Complete));
        assert_eq!(report.seed, Some(7));
        assert_eq!(report.decision.warnings.len(), 1);

        let graph = report.graph.as_ref().unwrap();
        let updates = kinds.iter().filter(|k| **k == EventKind::MetricUpdate).count();
        assert_eq!(updates, graph.len());
        assert_eq!(report.leaderboard.len(), graph.len());
    }

    #[test]
    fn absent_seed_is_recorded() {
        let (emitter, _sink) = recorded("rand");
        let report = Session::new()
            .run(RunConfig::new("t", Mode::Power).with_variant_count(1), &emitter)
            .unwrap();
        assert!(report.seed.is_some());
    }
}
