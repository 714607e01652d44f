//! Version nodes and their test results
//!
//! A [`VersionNode`] is one candidate artifact produced at some pipeline stage.
//! Fields are private so that the append-only rules hold by construction:
//! - the id and creation time never change
//! - the summary can only be appended to
//! - metrics can only be merged into (last writer wins per key)
//! - test results can only be appended

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle status of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Created, no work started
    #[default]
    Pending,
    /// Work in progress
    Running,
    /// Stage completed successfully
    Succeeded,
    /// Stage failed
    Failed,
}

impl NodeStatus {
    /// Wire name of the status
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Running => "running",
            NodeStatus::Succeeded => "succeeded",
            NodeStatus::Failed => "failed",
        }
    }

    /// Whether the status is final
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeStatus::Succeeded | NodeStatus::Failed)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one test execution attached to a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Whether the test passed
    pub passed: bool,
    /// Duration in milliseconds
    pub duration_ms: f64,
    /// Captured output
    pub logs: String,
    /// Line coverage in `[0, 1]`, when measured
    pub coverage: Option<f64>,
}

impl TestResult {
    /// Create a result without coverage
    #[must_use]
    pub fn new(name: impl Into<String>, passed: bool, duration_ms: f64, logs: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            duration_ms: duration_ms.max(0.0),
            logs: logs.into(),
            coverage: None,
        }
    }

    /// Attach coverage, clamped to `[0, 1]`
    #[inline]
    #[must_use]
    pub fn with_coverage(mut self, coverage: f64) -> Self {
        self.coverage = Some(coverage.clamp(0.0, 1.0));
        self
    }
}

/// A candidate artifact in the exploration graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionNode {
    id: String,
    parent_id: Option<String>,
    title: String,
    summary: String,
    status: NodeStatus,
    score: f64,
    cost_usd: f64,
    created_at: DateTime<Utc>,
    metrics: BTreeMap<String, f64>,
    tests: Vec<TestResult>,
    variant: u32,
}

impl VersionNode {
    /// Create a pending root node stamped with the current time
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            title: title.into(),
            summary: String::new(),
            status: NodeStatus::Pending,
            score: 0.0,
            cost_usd: 0.0,
            created_at: Utc::now(),
            metrics: BTreeMap::new(),
            tests: Vec::new(),
            variant: 0,
        }
    }

    /// Set the producing node
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent_id: Option<&str>) -> Self {
        self.parent_id = parent_id.map(str::to_owned);
        self
    }

    /// Set the initial summary
    #[inline]
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Set the status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the stage-local score, clamped to `[0, 1]`
    #[inline]
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = clamp_unit(score);
        self
    }

    /// Set the cost; negative values are floored at zero
    #[inline]
    #[must_use]
    pub fn with_cost(mut self, cost_usd: f64) -> Self {
        self.cost_usd = cost_usd.max(0.0);
        self
    }

    /// Override the creation timestamp
    #[inline]
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Add one metric
    #[inline]
    #[must_use]
    pub fn with_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    /// Add one test result
    #[inline]
    #[must_use]
    pub fn with_test(mut self, test: TestResult) -> Self {
        self.tests.push(test);
        self
    }

    /// Set the variant branch
    #[inline]
    #[must_use]
    pub fn with_variant(mut self, variant: u32) -> Self {
        self.variant = variant;
        self
    }

    /// Node identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Producing node, `None` for roots
    #[inline]
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Summary text
    #[inline]
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Status
    #[inline]
    #[must_use]
    pub fn status(&self) -> NodeStatus {
        self.status
    }

    /// Stage-local score in `[0, 1]`
    #[inline]
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Accumulated cost in USD
    #[inline]
    #[must_use]
    pub fn cost_usd(&self) -> f64 {
        self.cost_usd
    }

    /// Creation timestamp
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// All metrics
    #[inline]
    #[must_use]
    pub fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    /// Single metric lookup
    #[inline]
    #[must_use]
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }

    /// Test results in append order
    #[inline]
    #[must_use]
    pub fn tests(&self) -> &[TestResult] {
        &self.tests
    }

    /// Variant branch, 0 when not variant-specific
    #[inline]
    #[must_use]
    pub fn variant(&self) -> u32 {
        self.variant
    }

    /// Transition to a new status
    #[inline]
    pub fn set_status(&mut self, status: NodeStatus) {
        self.status = status;
    }

    /// Append text to the summary
    #[inline]
    pub fn append_summary(&mut self, text: &str) {
        self.summary.push_str(text);
    }

    /// Merge metrics into the existing map; colliding keys are overwritten
    pub fn merge_metrics<K, I>(&mut self, metrics: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
    {
        self.metrics
            .extend(metrics.into_iter().map(|(key, value)| (key.into(), value)));
    }

    /// Append a test result
    #[inline]
    pub fn push_test(&mut self, test: TestResult) {
        self.tests.push(test);
    }

    /// Add to the accumulated cost; negative amounts are ignored
    #[inline]
    pub fn add_cost(&mut self, amount_usd: f64) {
        if amount_usd > 0.0 {
            self.cost_usd += amount_usd;
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
