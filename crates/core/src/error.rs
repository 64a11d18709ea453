//! Core Error Types
//!
//! Errors a tool call can end in. Tools return them from `execute`; the
//! invoker adds `Timeout` and `Cancelled`; the registry adds `NotFound`.
//! Only thiserror + serde_json are needed, so tool crates can depend on
//! this without pulling in the pipeline.
//!
//! None of these abort a run. The executor records them as text on the
//! call result and wraps them in its own `AppError` only for config limits.

use thiserror::Error;

/// Failure of a tool call, or of a limit check shared with tools.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The tool ran and reported a failure (query error, upstream 5xx, ...)
    #[error("Tool error: {0}")]
    Tool(String),

    /// Input or limits rejected before any work was done
    #[error("Validation error: {0}")]
    Validation(String),

    /// No tool registered under the requested id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Tool output could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Per-call or run deadline exceeded; the message is shown as-is
    #[error("{0}")]
    Timeout(String),

    #[error("Execution cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::Tool(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether another attempt of the same call could succeed.
    ///
    /// Missing tools, rejected input, and cancellation are permanent.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            CoreError::NotFound(_) | CoreError::Validation(_) | CoreError::Cancelled
        )
    }
}

impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
