//! Error types for the policy gate

/// Policy errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// Mode string is not one of `SAFE`, `GUARDED`, `POWER`
    #[error("unknown execution mode: {0:?} (expected SAFE, GUARDED or POWER)")]
    UnknownMode(String),
}
