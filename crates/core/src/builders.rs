//! Executor Configuration Builder
//!
//! Follows the standard Rust builder pattern:
//! 1. Create with `::new()` or `::default()`
//! 2. Chain `.field(value)` calls
//! 3. Call `.build()` which validates and returns `CoreResult<BuiltExecutorConfig>`
//!
//! Validation happens at build time, catching configuration errors
//! before a plan is ever executed.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Upper bound on configured retries per tool call.
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
/// Default backoff before the first retry.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;
/// Default ceiling for the exponential backoff.
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5_000;
/// Default per tool-call deadline.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Built executor configuration (output of ExecutorConfigBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltExecutorConfig {
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub timeout_ms: u64,
    pub run_timeout_ms: Option<u64>,
    pub concurrent_collection: bool,
    pub concurrent_tool_calls: bool,
    pub count_partial_as_completed: bool,
}

/// Builder for executor configuration with validation at build time.
///
/// # Example
/// ```ignore
/// let config = ExecutorConfigBuilder::new()
///     .retry_attempts(3)
///     .timeout_ms(10_000)
///     .run_timeout_ms(120_000)
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct ExecutorConfigBuilder {
    retry_attempts: Option<u32>,
    retry_base_delay_ms: Option<u64>,
    retry_max_delay_ms: Option<u64>,
    timeout_ms: Option<u64>,
    run_timeout_ms: Option<u64>,
    concurrent_collection: Option<bool>,
    concurrent_tool_calls: Option<bool>,
    count_partial_as_completed: Option<bool>,
}

impl ExecutorConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set retries after the first attempt (0 disables retry).
    pub fn retry_attempts(mut self, n: u32) -> Self {
        self.retry_attempts = Some(n);
        self
    }

    /// Set the backoff before the first retry.
    pub fn retry_base_delay_ms(mut self, ms: u64) -> Self {
        self.retry_base_delay_ms = Some(ms);
        self
    }

    /// Set the backoff ceiling.
    pub fn retry_max_delay_ms(mut self, ms: u64) -> Self {
        self.retry_max_delay_ms = Some(ms);
        self
    }

    /// Set the per tool-call deadline.
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    /// Set a deadline for the whole run.
    pub fn run_timeout_ms(mut self, ms: u64) -> Self {
        self.run_timeout_ms = Some(ms);
        self
    }

    /// Run data requirements concurrently.
    pub fn concurrent_collection(mut self, enabled: bool) -> Self {
        self.concurrent_collection = Some(enabled);
        self
    }

    /// Run the tool calls of a step concurrently.
    pub fn concurrent_tool_calls(mut self, enabled: bool) -> Self {
        self.concurrent_tool_calls = Some(enabled);
        self
    }

    /// Count partial steps as completed when scoring.
    pub fn count_partial_as_completed(mut self, enabled: bool) -> Self {
        self.count_partial_as_completed = Some(enabled);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> CoreResult<BuiltExecutorConfig> {
        let retry_attempts = self.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS);
        let retry_base_delay_ms = self
            .retry_base_delay_ms
            .unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS);
        let retry_max_delay_ms = self
            .retry_max_delay_ms
            .unwrap_or(DEFAULT_RETRY_MAX_DELAY_MS);
        let timeout_ms = self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);

        validate_limits(
            retry_attempts,
            retry_base_delay_ms,
            retry_max_delay_ms,
            timeout_ms,
            self.run_timeout_ms,
        )?;

        Ok(BuiltExecutorConfig {
            retry_attempts,
            retry_base_delay_ms,
            retry_max_delay_ms,
            timeout_ms,
            run_timeout_ms: self.run_timeout_ms,
            concurrent_collection: self.concurrent_collection.unwrap_or(false),
            concurrent_tool_calls: self.concurrent_tool_calls.unwrap_or(false),
            count_partial_as_completed: self.count_partial_as_completed.unwrap_or(false),
        })
    }
}

/// Shared limit checks, also used when a config is deserialized directly.
pub fn validate_limits(
    retry_attempts: u32,
    retry_base_delay_ms: u64,
    retry_max_delay_ms: u64,
    timeout_ms: u64,
    run_timeout_ms: Option<u64>,
) -> CoreResult<()> {
    if retry_attempts > MAX_RETRY_ATTEMPTS {
        return Err(CoreError::validation(format!(
            "retry_attempts must be <= {}, got {}",
            MAX_RETRY_ATTEMPTS, retry_attempts
        )));
    }
    if timeout_ms == 0 {
        return Err(CoreError::validation("timeout_ms must be > 0"));
    }
    if retry_base_delay_ms > retry_max_delay_ms {
        return Err(CoreError::validation(format!(
            "retry_base_delay_ms ({}) must not exceed retry_max_delay_ms ({})",
            retry_base_delay_ms, retry_max_delay_ms
        )));
    }
    if run_timeout_ms == Some(0) {
        return Err(CoreError::validation("run_timeout_ms must be > 0 when set"));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
