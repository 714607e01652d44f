//! Run request and pipeline settings
//!
//! [`RunConfig`] is what the caller asks for; [`PipelineSettings`] are the
//! runner knobs that are not part of the request.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tourney_policy::Mode;

/// Default number of implementation variants
pub const DEFAULT_VARIANT_COUNT: u32 = 5;

/// Default exploration depth
pub const DEFAULT_MAX_DEPTH: u32 = 5;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f64 = 0.6;

/// Default tournament bracket size
pub const DEFAULT_TOURNAMENT_SIZE: u32 = 4;

/// Default cap on architect instances per run
pub const DEFAULT_MAX_ARCHITECTS: usize = 3;

/// One orchestration run request
///
/// `max_depth`, `temperature` and `tournament_size` are carried through for
/// downstream consumers; the pipeline itself does not read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    /// Task description
    pub task: String,
    /// Policy mode
    pub mode: Mode,
    /// Number of implementation variants (at least 1)
    pub variant_count: u32,
    /// Advisory exploration depth
    pub max_depth: u32,
    /// Advisory sampling temperature
    pub temperature: f64,
    /// Advisory tournament size
    pub tournament_size: u32,
    /// Top-level seed; `None` yields a non-reproducible run
    pub seed: Option<u64>,
    /// Capability identifiers checked by the policy gate
    #[serde(alias = "requestedTools")]
    pub requested_capabilities: Vec<String>,
}

impl RunConfig {
    /// Request with defaults for everything but task and mode
    #[must_use]
    pub fn new(task: impl Into<String>, mode: Mode) -> Self {
        Self {
            task: task.into(),
            mode,
            variant_count: DEFAULT_VARIANT_COUNT,
            max_depth: DEFAULT_MAX_DEPTH,
            temperature: DEFAULT_TEMPERATURE,
            tournament_size: DEFAULT_TOURNAMENT_SIZE,
            seed: None,
            requested_capabilities: Vec::new(),
        }
    }

    /// Set variant count
    #[inline]
    #[must_use]
    pub fn with_variant_count(mut self, variant_count: u32) -> Self {
        self.variant_count = variant_count;
        self
    }

    /// Set max depth
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set temperature
    #[inline]
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set tournament size
    #[inline]
    #[must_use]
    pub fn with_tournament_size(mut self, tournament_size: u32) -> Self {
        self.tournament_size = tournament_size;
        self
    }

    /// Set seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set requested capabilities
    #[must_use]
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested_capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    /// Parse a JSON run request
    ///
    /// # Errors
    /// - `ConfigError::InvalidJson` when `raw` is not JSON
    /// - any error of [`RunConfig::from_value`]
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    /// Parse an already-decoded run request
    ///
    /// Integer fields also accept decimal strings (`"3"`).
    ///
    /// # Errors
    /// - `ConfigError::NotAnObject` when `value` is not a JSON object
    /// - `ConfigError::MissingField` when `task` or `mode` is absent
    /// - `ConfigError::InvalidMode` for an unknown mode
    /// - `ConfigError::InvalidField` for a malformed field or a failed [`RunConfig::validate`]
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let Value::Object(fields) = value else {
            return Err(ConfigError::NotAnObject);
        };

        let task = required_str(&fields, "task")?;
        let mode: Mode = required_str(&fields, "mode")?.parse()?;
        let variant_count = optional_u32(&fields, "variantCount")?.unwrap_or(DEFAULT_VARIANT_COUNT);

        let requested_capabilities = match fields
            .get("requestedCapabilities")
            .or_else(|| fields.get("requestedTools"))
        {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        ConfigError::invalid("requestedCapabilities", "entries must be strings")
                    })
                })
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(ConfigError::invalid(
                    "requestedCapabilities",
                    "must be an array of strings",
                ))
            }
        };

        let config = Self {
            task: task.to_string(),
            mode,
            variant_count,
            max_depth: optional_u32(&fields, "maxDepth")?.unwrap_or(DEFAULT_MAX_DEPTH),
            temperature: optional_f64(&fields, "temperature")?.unwrap_or(DEFAULT_TEMPERATURE),
            tournament_size: optional_u32(&fields, "tournamentSize")?
                .unwrap_or(DEFAULT_TOURNAMENT_SIZE),
            seed: optional_seed(&fields)?,
            requested_capabilities,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants serde alone cannot express
    ///
    /// # Errors
    /// - `ConfigError::InvalidField` for a blank task or a zero variant count
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.task.trim().is_empty() {
            return Err(ConfigError::invalid("task", "must not be empty"));
        }
        if self.variant_count == 0 {
            return Err(ConfigError::invalid("variantCount", "must be a positive integer"));
        }
        Ok(())
    }
}

fn required_str<'a>(fields: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, ConfigError> {
    match fields.get(key) {
        None | Some(Value::Null) => Err(ConfigError::MissingField(key)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ConfigError::invalid(key, "must be a string")),
    }
}

fn optional_u64(fields: &Map<String, Value>, key: &'static str) -> Result<Option<u64>, ConfigError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| ConfigError::invalid(key, format!("expected a non-negative integer, got {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::invalid(key, format!("expected an integer, got {s:?}"))),
        Some(other) => Err(ConfigError::invalid(key, format!("expected an integer, got {other}"))),
    }
}

/// Seeds are any JSON integer; negatives keep their two's-complement bits
#[allow(clippy::cast_sign_loss)]
fn optional_seed(fields: &Map<String, Value>) -> Result<Option<u64>, ConfigError> {
    const KEY: &str = "seed";
    let signed = |n: i64| Some(n as u64);
    match fields.get(KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_i64().and_then(signed))
            .map(Some)
            .ok_or_else(|| ConfigError::invalid(KEY, format!("expected an integer, got {n}"))),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<i64>().ok().and_then(signed))
                .map(Some)
                .ok_or_else(|| ConfigError::invalid(KEY, format!("expected an integer, got {s:?}")))
        }
        Some(other) => Err(ConfigError::invalid(KEY, format!("expected an integer, got {other}"))),
    }
}

fn optional_u32(fields: &Map<String, Value>, key: &'static str) -> Result<Option<u32>, ConfigError> {
    optional_u64(fields, key)?
        .map(|n| u32::try_from(n).map_err(|_| ConfigError::invalid(key, format!("{n} is out of range"))))
        .transpose()
}

fn optional_f64(fields: &Map<String, Value>, key: &'static str) -> Result<Option<f64>, ConfigError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ConfigError::invalid(key, format!("expected a number, got {s:?}"))),
        Some(other) => Err(ConfigError::invalid(key, format!("expected a number, got {other}"))),
    }
}

/// How the per-variant chains are executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainExecution {
    /// One chain after another on the calling thread
    #[default]
    Sequential,
    /// Chains run on the rayon pool and are merged in variant order
    Parallel,
}

/// Runner knobs that are not part of the run request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Cap on architect instances
    pub max_architects: usize,
    /// Variant chain scheduling
    pub chain_execution: ChainExecution,
}

impl PipelineSettings {
    /// Default settings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set architect cap
    #[inline]
    #[must_use]
    pub fn with_max_architects(mut self, max_architects: usize) -> Self {
        self.max_architects = max_architects;
        self
    }

    /// Set chain execution
    #[inline]
    #[must_use]
    pub fn with_chain_execution(mut self, chain_execution: ChainExecution) -> Self {
        self.chain_execution = chain_execution;
        self
    }

    /// Architect instances for a given variant count
    #[inline]
    #[must_use]
    pub fn architect_count(&self, variant_count: u32) -> usize {
        self.max_architects.min(variant_count as usize)
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_architects: DEFAULT_MAX_ARCHITECTS,
            chain_execution: ChainExecution::Sequential,
        }
    }
}
