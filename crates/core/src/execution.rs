//! Task execution module
//!
//! This module resolves the prerequisite closure of the requested targets into
//! an ordered plan and executes it, tracking completed tasks per run.

pub mod plan;
pub mod record;
pub mod runner;

pub use plan::{resolve_execution_plan, ExecutionPlan};
pub use record::ExecutionRecord;
pub use runner::{TaskRunner, TaskRunnerConfig};
