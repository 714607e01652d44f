//! Execution modes

use crate::error::PolicyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Execution policy mode selected for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// High-risk capabilities are denied
    Safe,
    /// Everything allowed, some capabilities monitored
    Guarded,
    /// Everything allowed, nothing monitored
    Power,
}

impl Mode {
    /// All modes, most restrictive first
    pub const ALL: [Mode; 3] = [Mode::Safe, Mode::Guarded, Mode::Power];

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Safe => "SAFE",
            Mode::Guarded => "GUARDED",
            Mode::Power => "POWER",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SAFE" => Ok(Mode::Safe),
            "GUARDED" => Ok(Mode::Guarded),
            "POWER" => Ok(Mode::Power),
            other => Err(PolicyError::UnknownMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parse_round_trip() {
        for mode in Mode::ALL {
            assert_eq!(mode.as_str().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn mode_parse_is_case_sensitive() {
        let err = "safe".parse::<Mode>().unwrap_err();
        assert_eq!(err, PolicyError::UnknownMode("safe".to_string()));
    }

    #[test]
    fn mode_serde_uses_uppercase() {
        assert_eq!(serde_json::to_string(&Mode::Guarded).unwrap(), "\"GUARDED\"");
        let mode: Mode = serde_json::from_str("\"POWER\"").unwrap();
        assert_eq!(mode, Mode::Power);
    }
}
