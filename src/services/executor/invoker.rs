//! Tool Invoker
//!
//! Wraps every tool call made by the pipeline with a per-attempt timeout,
//! bounded retries with exponential backoff, a run-wide deadline, and
//! cancellation. Failures are returned as values; nothing here panics or
//! propagates an error to the caller. A tool that panics is reported as an
//! internal error and is not retried.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use analyst_core::{CoreError, CoreResult, ToolContext, ToolRegistry};
use futures_util::FutureExt;
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::settings::ExecutorConfig;

/// Retry and timeout policy for a single tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Per-attempt deadline
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self {
            max_attempts: config.retry_attempts.saturating_add(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Backoff before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at `max_delay`.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ExecutorConfig::default())
    }
}

/// Result of invoking one tool, including retries.
#[derive(Debug)]
pub struct InvocationOutcome {
    pub result: CoreResult<Value>,
    /// Attempts actually started (0 when the tool was never called)
    pub attempts: u32,
    pub elapsed_ms: u64,
}

/// Run-scoped tool caller.
#[derive(Clone)]
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
    policy: RetryPolicy,
    cancellation_token: CancellationToken,
    deadline: Option<Instant>,
}

impl ToolInvoker {
    pub fn new(
        registry: Arc<ToolRegistry>,
        policy: RetryPolicy,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            registry,
            policy,
            cancellation_token,
            deadline: None,
        }
    }

    /// Stop starting new attempts once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Invoke `tool_id` with `input`, retrying retryable failures.
    pub async fn invoke(&self, tool_id: &str, ctx: ToolContext, input: Value) -> InvocationOutcome {
        let start = Instant::now();
        let finish = |result: CoreResult<Value>, attempts: u32| InvocationOutcome {
            result,
            attempts,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        let Some(tool) = self.registry.get(tool_id) else {
            return finish(
                Err(CoreError::not_found(format!("Tool not found: {}", tool_id))),
                0,
            );
        };

        let mut attempt = 0u32;
        loop {
            if self.is_cancelled() {
                return finish(Err(CoreError::Cancelled), attempt);
            }

            let budget = match self.remaining() {
                Some(left) if left.is_zero() => {
                    return finish(Err(CoreError::timeout("Run deadline exceeded")), attempt);
                }
                Some(left) => left.min(self.policy.timeout),
                None => self.policy.timeout,
            };

            attempt += 1;
            let attempt_ctx = ctx.clone().with_attempt(attempt);
            debug!(
                "[ToolInvoker] Calling '{}' ({}), attempt {}/{}",
                tool_id,
                attempt_ctx.tool_call_id(),
                attempt,
                self.policy.max_attempts
            );

            let call = AssertUnwindSafe(tool.execute(&attempt_ctx, input.clone())).catch_unwind();
            let mut panicked = false;
            let result = tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => Err(CoreError::Cancelled),
                outcome = tokio::time::timeout(budget, call) => {
                    match outcome {
                        Ok(Ok(result)) => result,
                        Ok(Err(_)) => {
                            panicked = true;
                            Err(CoreError::internal(format!("Tool '{}' panicked", tool_id)))
                        }
                        Err(_) => Err(CoreError::timeout(format!(
                            "Tool '{}' timed out after {}ms",
                            tool_id,
                            budget.as_millis()
                        ))),
                    }
                }
            };

            let err = match result {
                Ok(value) => return finish(Ok(value), attempt),
                Err(err) => err,
            };

            if panicked || attempt >= self.policy.max_attempts || !err.is_retryable() {
                warn!(
                    "[ToolInvoker] '{}' failed after {} attempt(s): {}",
                    tool_id, attempt, err
                );
                return finish(Err(err), attempt);
            }

            let backoff = self.policy.backoff_for(attempt);
            if self.remaining().is_some_and(|left| left <= backoff) {
                warn!(
                    "[ToolInvoker] '{}' failed and the run deadline leaves no room to retry: {}",
                    tool_id, err
                );
                return finish(Err(err), attempt);
            }

            warn!(
                "[ToolInvoker] '{}' attempt {} failed, retrying in {}ms: {}",
                tool_id,
                attempt,
                backoff.as_millis(),
                err
            );

            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    return finish(Err(CoreError::Cancelled), attempt);
                }
                _ = tokio::time::sleep(backoff) => {}
            }
        }
    }
}
