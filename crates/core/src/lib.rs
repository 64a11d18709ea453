//! Analyst Core
//!
//! Foundational traits, error types, and the tool registry for the Analyst
//! plan executor. This crate has no dependency on the execution pipeline and
//! no async runtime of its own.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `context` - Execution context hierarchy (`ExecutionContext`, `ToolContext`)
//! - `tool_trait` - Tool abstraction (`ToolDefinition`, `ToolExecutable`, `AnalysisTool`)
//!   and the capability-tagged `ToolRegistry`
//! - `builders` - Validated builder for executor configuration

pub mod builders;
pub mod context;
pub mod error;
pub mod tool_trait;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Context Hierarchy ──────────────────────────────────────────────────
pub use context::{ExecutionContext, ToolContext};

// ── Tool Trait & Registry ──────────────────────────────────────────────
pub use tool_trait::{
    AnalysisTool, DataSourceKind, ResolutionStrategy, ToolCapability, ToolDefinition,
    ToolExecutable, ToolRegistry, ToolResolution,
};

// ── Builders ───────────────────────────────────────────────────────────
pub use builders::{BuiltExecutorConfig, ExecutorConfigBuilder};
