//! Error Handling
//!
//! Plan-level error type for the executor.
//!
//! Only failures outside the plan's own execution surface here (malformed
//! plans, unreadable or out-of-range configuration). Tool and step failures
//! are recorded in the `ExecutorOutput` instead.

use analyst_core::CoreError;
use thiserror::Error;

/// Errors that stop a run before it starts
#[derive(Error, Debug)]
pub enum AppError {
    /// Config file could not be read
    #[error("Configuration error: {0}")]
    Config(String),

    /// Config file is not valid TOML for `ExecutorConfig`
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Malformed plan
    #[error("Validation error: {0}")]
    Validation(String),

    /// Limit checks shared with the core builders
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Convert AppError to a string for callers that forward errors over the wire
impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
