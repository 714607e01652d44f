//! Tourney Core - orchestration engine
//!
//! Runs a request through the policy gate, the staged agent pipeline and the
//! score evaluator, streaming progress as ordered event records:
//! - [`Session`]: the sequencing contract of one run
//! - [`PipelineRunner`]: plan, architectures, then one chain per variant
//! - [`agents`]: the six agent roles behind the [`Agent`] trait
//! - [`ScoreEvaluator`]: weighted leaderboard over a finished graph
//! - [`EventEmitter`]: `{type, payload, sessionId}` records to a sink
//! - [`export`]: best version and scoreboard from a recorded history
//!
//! # Example
//!
//! ```rust
//! use tourney_core::{EventEmitter, EventKind, MemorySink, RunConfig, Session};
//! use tourney_policy::Mode;
//!
//! let sink = MemorySink::new();
//! let emitter = EventEmitter::new("session-1", sink.clone());
//! let config = RunConfig::new("Build a tournament search", Mode::Power)
//!     .with_variant_count(2)
//!     .with_seed(1234);
//!
//! let report = Session::new().run(config, &emitter).unwrap();
//! assert!(report.best_version_id.is_some());
//! assert_eq!(sink.kinds().last(), Some(&EventKind::Complete));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod agents;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod pipeline;
pub mod scoring;
pub mod seed;
pub mod session;

pub use agents::{Agent, AgentContext, AgentRole, AgentSet, VariantChain};
pub use config::{ChainExecution, PipelineSettings, RunConfig};
pub use error::{AgentError, ConfigError, EmitError, ErrorKind, ExportError, SessionError};
pub use events::{
    Completion, Event, EventEmitter, EventKind, EventPayload, EventSink, JsonLinesSink, LogEntry,
    MemorySink, MetricSample, MetricUpdate, RunStatus,
};
pub use export::{export_best, export_scoreboard, read_history, BestVersion, ExportMetadata};
pub use pipeline::{PipelineOutcome, PipelineRunner};
pub use scoring::{ScoreBreakdown, ScoreEvaluator, ScoreWeights};
pub use seed::{derive_seed, resolve_seed, SeedRole};
pub use session::{Roster, Session, SessionReport};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running sessions
    pub use crate::{
        Agent, AgentContext, EventEmitter, EventKind, EventPayload, MemorySink, PipelineRunner,
        RunConfig, Session, SessionError, SessionReport,
    };
    pub use tourney_graph::{VersionGraph, VersionNode};
    pub use tourney_policy::Mode;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
