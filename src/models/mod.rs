//! Data Models
//!
//! Plan inputs, execution results, and executor settings.

pub mod execution;
pub mod plan;
pub mod settings;

pub use execution::*;
pub use plan::*;
pub use settings::*;
