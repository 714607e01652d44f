//! Error types for Tourney Core
//!
//! Provides error handling for:
//! - Run request parsing (fails before any event is emitted)
//! - Agent faults (abort the pipeline, no `complete` event)
//! - Event emission to the output stream
//! - History export
//!
//! Policy denial and missing agent targets are not errors.

use tourney_graph::GraphError;
use tourney_policy::PolicyError;

/// Main session error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Malformed run request
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An agent failed; the run was aborted
    #[error("agent failed: {0}")]
    Agent(#[from] AgentError),

    /// A graph mutation was rejected
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// The event stream could not be written
    #[error("emission failed: {0}")]
    Emit(#[from] EmitError),

    /// Exporting a recorded history failed
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

impl SessionError {
    /// Classify the error
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::Agent(_) => ErrorKind::AgentFailure,
            Self::Graph(_) => ErrorKind::Graph,
            Self::Emit(_) => ErrorKind::Emission,
            Self::Export(_) => ErrorKind::Export,
        }
    }

    /// Whether the error was raised before the pipeline started
    #[inline]
    #[must_use]
    pub fn is_preflight(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Coarse classification of [`SessionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed run input
    Configuration,
    /// Fault inside an agent
    AgentFailure,
    /// Rejected graph mutation
    Graph,
    /// Output stream failure
    Emission,
    /// History export failure
    Export,
}

/// Run request parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Request is not valid JSON
    #[error("invalid request JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Request is valid JSON but not an object
    #[error("run request must be a JSON object")]
    NotAnObject,

    /// Required field absent
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Field present but unusable
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Field name as it appears in the request
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Mode string is not one of the known modes
    #[error("invalid mode: {0}")]
    InvalidMode(#[from] PolicyError),
}

impl ConfigError {
    /// Create an invalid-field error
    #[inline]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Field the error refers to, if any
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField(field) | Self::InvalidField { field, .. } => Some(field),
            Self::InvalidMode(_) => Some("mode"),
            Self::InvalidJson(_) | Self::NotAnObject => None,
        }
    }
}

/// Agent execution errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// The agent could not produce its output
    #[error("{agent}: {reason}")]
    Failed {
        /// Agent name
        agent: String,
        /// Failure description
        reason: String,
    },
}

impl AgentError {
    /// Create a failure error
    #[inline]
    pub fn failed(agent: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            agent: agent.into(),
            reason: reason.into(),
        }
    }

    /// Name of the failing agent
    #[must_use]
    pub fn agent(&self) -> &str {
        match self {
            Self::Failed { agent, .. } => agent,
        }
    }
}

/// Event emission errors
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// Sink write failed
    #[error("sink write failed: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized
    #[error("event serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// History export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// No graph snapshot in the history contains a node
    #[error("no versions available to export")]
    NoVersions,

    /// A history line is not a valid event record
    #[error("malformed history record on line {line}: {source}")]
    MalformedRecord {
        /// One-based line number
        line: usize,
        /// Parse failure
        #[source]
        source: serde_json::Error,
    },

    /// History could not be read
    #[error("history read failed: {0}")]
    Io(#[from] std::io::Error),
}
