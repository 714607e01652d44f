//! Identifier factory
//!
//! One factory is owned by a pipeline run and is the single source of node
//! and edge identifiers for that run. The counter is shared across prefixes,
//! so `plan-1`, `arch-2`, `edge-3` never collide even though the prefixes differ.

use std::sync::atomic::{AtomicU64, Ordering};

/// Prefix used when the caller does not supply one
pub const DEFAULT_PREFIX: &str = "node";

/// Generates `"{prefix}-{counter}"` identifiers from a monotonic counter
///
/// The counter starts at 1 and is incremented on every call regardless of
/// prefix. It is atomic, so a factory can be shared by reference between
/// concurrently running variant chains.
#[derive(Debug)]
pub struct IdFactory {
    prefix: String,
    counter: AtomicU64,
}

impl IdFactory {
    /// Create a factory using [`DEFAULT_PREFIX`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Create a factory with a custom default prefix
    #[inline]
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(1),
        }
    }

    /// Next identifier under the factory's default prefix
    #[inline]
    pub fn next_id(&self) -> String {
        let value = self.bump();
        format!("{}-{}", self.prefix, value)
    }

    /// Next identifier under `prefix`
    #[inline]
    pub fn new_id(&self, prefix: &str) -> String {
        let value = self.bump();
        format!("{prefix}-{value}")
    }

    /// Number of identifiers handed out so far
    #[inline]
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed) - 1
    }

    /// Default prefix of this factory
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn bump(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdFactory {
    fn default() -> Self {
        Self::new()
    }
}
