//! Tourney Policy - the pre-flight gate
//!
//! Decides, once per run and before any agent executes, whether the requested
//! external capabilities are acceptable under the selected [`Mode`]:
//! - [`PolicyGuard`]: evaluates a request against a [`PolicyTable`]
//! - [`PolicyDecision`]: allowed flag, denial reason, sorted advisories
//! - [`DEFAULT_CAPABILITIES`]: what a run requests when it names nothing
//!
//! # Example
//!
//! ```rust
//! use tourney_policy::{Mode, PolicyGuard};
//!
//! let guard = PolicyGuard::new();
//! let decision = guard.evaluate(Mode::Safe, ["browserless", "openai:gpt-5-codex"]);
//! assert!(!decision.allowed);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod capability;
mod error;
mod guard;
mod mode;

pub use capability::DEFAULT_CAPABILITIES;
pub use error::PolicyError;
pub use guard::{ModeRules, PolicyDecision, PolicyGuard, PolicyTable, GUARDED_WARNED, SAFE_DENIED};
pub use mode::Mode;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
