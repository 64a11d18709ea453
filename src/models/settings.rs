//! Settings Models
//!
//! Executor configuration: retry/timeout policy, opt-in concurrency, and the
//! partial-step scoring switch. Loadable from TOML (`[executor]` table or a
//! bare document) and partially updatable at runtime.

use std::path::Path;

use analyst_core::builders::{
    validate_limits, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY_MS,
    DEFAULT_RETRY_MAX_DELAY_MS, DEFAULT_TIMEOUT_MS,
};
use analyst_core::BuiltExecutorConfig;
use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, AppResult};

/// Executor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorConfig {
    /// Retries after the first attempt of a tool call
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Backoff before the first retry; doubles per retry
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Backoff ceiling
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// Deadline for a single tool-call attempt
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Deadline for the whole run
    #[serde(default)]
    pub run_timeout_ms: Option<u64>,
    /// Resolve data requirements concurrently
    #[serde(default)]
    pub concurrent_collection: bool,
    /// Run the tool calls of one step concurrently
    #[serde(default)]
    pub concurrent_tool_calls: bool,
    /// Count partial steps as completed in confidence and quality scores
    #[serde(default)]
    pub count_partial_as_completed: bool,
}

fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

fn default_retry_base_delay_ms() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}

fn default_retry_max_delay_ms() -> u64 {
    DEFAULT_RETRY_MAX_DELAY_MS
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            timeout_ms: default_timeout_ms(),
            run_timeout_ms: None,
            concurrent_collection: false,
            concurrent_tool_calls: false,
            count_partial_as_completed: false,
        }
    }
}

impl From<BuiltExecutorConfig> for ExecutorConfig {
    fn from(built: BuiltExecutorConfig) -> Self {
        Self {
            retry_attempts: built.retry_attempts,
            retry_base_delay_ms: built.retry_base_delay_ms,
            retry_max_delay_ms: built.retry_max_delay_ms,
            timeout_ms: built.timeout_ms,
            run_timeout_ms: built.run_timeout_ms,
            concurrent_collection: built.concurrent_collection,
            concurrent_tool_calls: built.concurrent_tool_calls,
            count_partial_as_completed: built.count_partial_as_completed,
        }
    }
}

/// TOML documents may nest the config under `[executor]`.
#[derive(Debug, Deserialize)]
struct ConfigDocument {
    executor: Option<ExecutorConfig>,
}

impl ExecutorConfig {
    /// Check limits shared with `ExecutorConfigBuilder`.
    pub fn validate(&self) -> AppResult<()> {
        validate_limits(
            self.retry_attempts,
            self.retry_base_delay_ms,
            self.retry_max_delay_ms,
            self.timeout_ms,
            self.run_timeout_ms,
        )?;
        Ok(())
    }

    /// Parse and validate a TOML document.
    ///
    /// Accepts either an `[executor]` table or top-level keys.
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let document: ConfigDocument = toml::from_str(content)?;
        let config = match document.executor {
            Some(config) => config,
            None => toml::from_str(content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply a partial update, validating the result.
    ///
    /// The config is left unchanged when the update would make it invalid.
    pub fn apply_update(&mut self, update: ExecutorConfigUpdate) -> AppResult<()> {
        let mut next = self.clone();
        if let Some(v) = update.retry_attempts {
            next.retry_attempts = v;
        }
        if let Some(v) = update.retry_base_delay_ms {
            next.retry_base_delay_ms = v;
        }
        if let Some(v) = update.retry_max_delay_ms {
            next.retry_max_delay_ms = v;
        }
        if let Some(v) = update.timeout_ms {
            next.timeout_ms = v;
        }
        if let Some(v) = update.run_timeout_ms {
            next.run_timeout_ms = v;
        }
        if let Some(v) = update.concurrent_collection {
            next.concurrent_collection = v;
        }
        if let Some(v) = update.concurrent_tool_calls {
            next.concurrent_tool_calls = v;
        }
        if let Some(v) = update.count_partial_as_completed {
            next.count_partial_as_completed = v;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

/// Partial config update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorConfigUpdate {
    pub retry_attempts: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub retry_max_delay_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    /// `Some(None)` clears the run deadline
    pub run_timeout_ms: Option<Option<u64>>,
    pub concurrent_collection: Option<bool>,
    pub concurrent_tool_calls: Option<bool>,
    pub count_partial_as_completed: Option<bool>,
}
