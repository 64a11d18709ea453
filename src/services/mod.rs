//! Services
//!
//! Business logic of the executor.

pub mod executor;

pub use executor::{DataCollector, ExecutionState, PlanExecutor, StepRunner, Synthesizer, ToolInvoker};
