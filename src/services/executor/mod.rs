//! Plan Executor Module
//!
//! Carries a structured analysis plan to completion against pluggable tools.
//!
//! ## Pipeline
//!
//! 1. `PlanExecutor` validates the plan and creates a fresh `ExecutionState`
//! 2. `DataCollector` resolves every data requirement to a tool and scores
//!    what comes back
//! 3. `StepRunner` executes each non-skipped analysis step in plan order
//! 4. `Synthesizer` folds the state and all results into an `ExecutorOutput`
//!
//! Every tool call goes through `ToolInvoker`, which applies the per-call
//! timeout, bounded retries, the run deadline, and cancellation.

pub mod collector;
pub mod invoker;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod state;
pub mod step_runner;
pub mod synthesizer;

pub use collector::DataCollector;
pub use invoker::{InvocationOutcome, RetryPolicy, ToolInvoker};
pub use pipeline::PlanExecutor;
pub use state::ExecutionState;
pub use step_runner::StepRunner;
pub use synthesizer::Synthesizer;
