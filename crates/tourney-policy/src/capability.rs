//! Capability identifiers of external collaborators
//!
//! The core never talks to these services itself. It only needs the
//! identifier string each one is requested under, so the policy gate can
//! match requests against the mode tables.

/// Capabilities requested by a run when the caller does not name any
pub const DEFAULT_CAPABILITIES: [&str; 7] = [
    "openai:gpt-5-codex",
    "modal:python",
    "wolfram",
    "pinecone",
    "supabase",
    "redis",
    "browserless",
];
