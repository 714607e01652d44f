//! Policy gate
//!
//! Evaluated exactly once per run, before any agent executes. A mode maps to a
//! denied set and a warned set of capability identifiers:
//! - any requested capability in the denied set vetoes the whole run
//! - requested capabilities in the warned set produce advisories only

use crate::mode::Mode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Capabilities denied in [`Mode::Safe`]
pub const SAFE_DENIED: [&str; 4] = ["bigquery", "browserless", "playwright", "snowflake"];

/// Capabilities monitored in [`Mode::Guarded`]
pub const GUARDED_WARNED: [&str; 2] = ["browserless", "modal:python"];

/// Outcome of a policy evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Whether the run may proceed
    pub allowed: bool,
    /// Why the run was denied; present iff `allowed` is false
    pub reason: Option<String>,
    /// Advisories, sorted
    pub warnings: Vec<String>,
}

impl PolicyDecision {
    /// Allowed decision with advisories
    #[inline]
    #[must_use]
    pub fn allow(warnings: Vec<String>) -> Self {
        Self {
            allowed: true,
            reason: None,
            warnings,
        }
    }

    /// Denied decision
    #[inline]
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            warnings: Vec::new(),
        }
    }
}

/// Denied and warned capability sets of one mode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeRules {
    /// Requests intersecting this set are denied
    pub denied: BTreeSet<String>,
    /// Requests intersecting this set are flagged
    pub warned: BTreeSet<String>,
}

impl ModeRules {
    /// Rules from string slices
    #[must_use]
    pub fn new(denied: &[&str], warned: &[&str]) -> Self {
        Self {
            denied: denied.iter().map(|s| (*s).to_string()).collect(),
            warned: warned.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Static mode → rules table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTable {
    rules: BTreeMap<Mode, ModeRules>,
}

impl PolicyTable {
    /// The standard table
    #[must_use]
    pub fn standard() -> Self {
        let mut rules = BTreeMap::new();
        rules.insert(Mode::Safe, ModeRules::new(&SAFE_DENIED, &[]));
        rules.insert(Mode::Guarded, ModeRules::new(&[], &GUARDED_WARNED));
        rules.insert(Mode::Power, ModeRules::default());
        Self { rules }
    }

    /// Replace the rules of one mode
    #[inline]
    #[must_use]
    pub fn with_rules(mut self, mode: Mode, rules: ModeRules) -> Self {
        self.rules.insert(mode, rules);
        self
    }

    /// Rules for a mode; modes without an entry allow everything
    #[must_use]
    pub fn rules(&self, mode: Mode) -> ModeRules {
        self.rules.get(&mode).cloned().unwrap_or_default()
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Decides whether a run may proceed under a mode
#[derive(Debug, Clone, Default)]
pub struct PolicyGuard {
    table: PolicyTable,
}

impl PolicyGuard {
    /// Guard over the standard table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard over a custom table
    #[inline]
    #[must_use]
    pub fn with_table(table: PolicyTable) -> Self {
        Self { table }
    }

    /// The table in use
    #[inline]
    #[must_use]
    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// Evaluate a capability request
    ///
    /// Pure function of `(mode, requested)`. Duplicate requests are collapsed;
    /// denied capabilities and warnings are reported in lexicographic order.
    pub fn evaluate<I, S>(&self, mode: Mode, requested: I) -> PolicyDecision
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let requested: BTreeSet<String> = requested
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        let rules = self.table.rules(mode);

        let denied: Vec<&str> = requested
            .intersection(&rules.denied)
            .map(String::as_str)
            .collect();
        if !denied.is_empty() {
            let reason = format!("Denied by policy guard: {}", denied.join(", "));
            tracing::warn!("Policy denied {} request: {}", mode, reason);
            return PolicyDecision::deny(reason);
        }

        let warnings: Vec<String> = requested
            .intersection(&rules.warned)
            .map(|capability| format!("Use of {capability} monitored"))
            .collect();
        tracing::debug!(
            "Policy allowed {} request ({} capabilities, {} warnings)",
            mode,
            requested.len(),
            warnings.len()
        );
        PolicyDecision::allow(warnings)
    }
}
