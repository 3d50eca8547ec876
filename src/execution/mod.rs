//! Execution module
//!
//! Turns order plans into broker orders, one submission at a time

mod coordinator;
mod types;

pub use coordinator::ExecutionCoordinator;
pub use types::{ExecutionError, ExecutionResult, LegOutcome, LegStatus};
