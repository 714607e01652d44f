//! Event stream
//!
//! Every record is `{type, payload, sessionId}`. The [`EventEmitter`] writes
//! one record per call to its sink, in call order, and never buffers.
//!
//! # Event kinds
//!
//! | type           | payload                                   |
//! |----------------|-------------------------------------------|
//! | `policy`       | [`PolicyDecision`]                        |
//! | `log`          | [`LogEntry`]                              |
//! | `graph-update` | [`GraphSnapshot`] (`graph` accepted on read) |
//! | `metric`       | list of [`MetricSample`]                  |
//! | `metric-update`| [`MetricUpdate`]                          |
//! | `complete`     | [`Completion`]                            |

use crate::error::EmitError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tourney_graph::{GraphSnapshot, VersionGraph};
use tourney_policy::PolicyDecision;

/// Record type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// Policy gate decision
    Policy,
    /// Free text progress
    Log,
    /// Full graph snapshot
    #[serde(alias = "graph")]
    GraphUpdate,
    /// Batch of named observations
    Metric,
    /// Score breakdown of one node
    MetricUpdate,
    /// Terminal marker
    Complete,
}

impl EventKind {
    /// Wire tag
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Policy => "policy",
            EventKind::Log => "log",
            EventKind::GraphUpdate => "graph-update",
            EventKind::Metric => "metric",
            EventKind::MetricUpdate => "metric-update",
            EventKind::Complete => "complete",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free text progress attached to a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Node the message is about
    pub version_id: Option<String>,
    /// Message text
    pub content: String,
}

/// One named observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Observation name
    pub name: String,
    /// Observed value
    pub value: f64,
    /// Unit, when meaningful
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl MetricSample {
    /// Unitless sample
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            unit: None,
        }
    }

    /// Attach a unit
    #[inline]
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Score components of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricUpdate {
    /// Scored node
    pub version_id: String,
    /// `compositeScore` plus the named components
    pub metrics: BTreeMap<String, f64>,
}

/// Final run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Pipeline and scoring finished
    Done,
}

/// Terminal marker payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    /// Final status
    pub status: RunStatus,
    /// Top-ranked node, `None` for an empty graph
    pub best_version_id: Option<String>,
}

/// Typed event body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    /// Policy gate decision
    Policy(PolicyDecision),
    /// Progress text
    Log(LogEntry),
    /// Graph snapshot
    GraphUpdate(GraphSnapshot),
    /// Observation batch
    Metric(Vec<MetricSample>),
    /// Score breakdown
    MetricUpdate(MetricUpdate),
    /// Terminal marker
    Complete(Completion),
}

impl EventPayload {
    /// Log entry about a node
    #[must_use]
    pub fn log(version_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Log(LogEntry {
            version_id: Some(version_id.into()),
            content: content.into(),
        })
    }

    /// Snapshot of the graph as it is now
    #[inline]
    #[must_use]
    pub fn graph(graph: &VersionGraph) -> Self {
        Self::GraphUpdate(graph.snapshot())
    }

    /// Terminal marker
    #[inline]
    #[must_use]
    pub fn complete(best_version_id: Option<String>) -> Self {
        Self::Complete(Completion {
            status: RunStatus::Done,
            best_version_id,
        })
    }

    /// Record type tag
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Policy(_) => EventKind::Policy,
            Self::Log(_) => EventKind::Log,
            Self::GraphUpdate(_) => EventKind::GraphUpdate,
            Self::Metric(_) => EventKind::Metric,
            Self::MetricUpdate(_) => EventKind::MetricUpdate,
            Self::Complete(_) => EventKind::Complete,
        }
    }

    fn decode(kind: EventKind, payload: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            EventKind::Policy => Self::Policy(serde_json::from_value(payload)?),
            EventKind::Log => Self::Log(serde_json::from_value(payload)?),
            EventKind::GraphUpdate => Self::GraphUpdate(serde_json::from_value(payload)?),
            EventKind::Metric => Self::Metric(serde_json::from_value(payload)?),
            EventKind::MetricUpdate => Self::MetricUpdate(serde_json::from_value(payload)?),
            EventKind::Complete => Self::Complete(serde_json::from_value(payload)?),
        })
    }
}

/// One record of the stream
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "EventRecord")]
pub struct Event {
    /// Run correlation id
    pub session_id: String,
    /// Typed body
    pub payload: EventPayload,
}

impl Event {
    /// Create a record
    #[must_use]
    pub fn new(session_id: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            session_id: session_id.into(),
            payload,
        }
    }

    /// Record type tag
    #[inline]
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Event", 3)?;
        state.serialize_field("type", &self.kind())?;
        state.serialize_field("payload", &self.payload)?;
        state.serialize_field("sessionId", &self.session_id)?;
        state.end()
    }
}

#[derive(Deserialize)]
struct EventRecord {
    #[serde(rename = "type")]
    kind: EventKind,
    payload: serde_json::Value,
    #[serde(rename = "sessionId", default)]
    session_id: String,
}

impl TryFrom<EventRecord> for Event {
    type Error = serde_json::Error;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            session_id: record.session_id,
            payload: EventPayload::decode(record.kind, record.payload)?,
        })
    }
}

/// Destination of serialized records
pub trait EventSink: Send {
    /// Write one record
    ///
    /// # Errors
    /// `EmitError` when the record cannot be serialized or written.
    fn write(&mut self, event: &Event) -> Result<(), EmitError>;
}

/// Newline-delimited JSON, flushed after every record
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wrap a writer
    #[inline]
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Unwrap the writer
    #[inline]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn write(&mut self, event: &Event) -> Result<(), EmitError> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory history; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl MemorySink {
    /// Empty history
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record so far
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Record tags so far
    #[must_use]
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(Event::kind).collect()
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemorySink {
    fn write(&mut self, event: &Event) -> Result<(), EmitError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Session-scoped writer of the event stream
///
/// Emissions from several threads are serialized; a record is written whole
/// before the next one starts.
pub struct EventEmitter {
    session_id: String,
    sink: Mutex<Box<dyn EventSink>>,
}

impl EventEmitter {
    /// Emitter for one session
    pub fn new(session_id: impl Into<String>, sink: impl EventSink + 'static) -> Self {
        Self {
            session_id: session_id.into(),
            sink: Mutex::new(Box::new(sink)),
        }
    }

    /// Session correlation id
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Write one record
    ///
    /// # Errors
    /// Whatever the sink reports; the record may be partially written.
    pub fn emit(&self, payload: EventPayload) -> Result<(), EmitError> {
        let event = Event::new(self.session_id.clone(), payload);
        tracing::trace!("emit {} for session {}", event.kind(), self.session_id);
        self.sink.lock().write(&event)
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}
