//! Result types for task runs
//!
//! A run either produces a [`RunReport`] or stops at the first failing task
//! with a [`TaskError`]. Callers that want live progress install a
//! [`RunObserver`] on the runner.

use std::time::Duration;

use petgraph::Graph;

use crate::registry::TaskKind;
use crate::types::TaskError;

/// Outcome of invoking one or more top-level tasks
pub type RunResult = Result<RunReport, TaskError>;

/// A task body that completed during a run
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub name: String,
    pub kind: TaskKind,
    pub elapsed: Duration,
}

/// Summary of a successful run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub targets: Vec<String>,
    /// Tasks executed by this invocation, in execution order
    pub executed: Vec<TaskOutcome>,
    /// Tasks already completed earlier in the same execution record
    pub skipped: Vec<String>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn executed_names(&self) -> Vec<&str> {
        self.executed.iter().map(|o| o.name.as_str()).collect()
    }
}

/// Information about a registered task, for listing
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: String,
    pub description: Option<String>,
    pub prerequisites: Vec<String>,
    pub kind: TaskKind,
}

/// Task dependency graph; edges point from a task to its prerequisites.
/// The graph is validated when the manager is built, so it is acyclic.
#[derive(Debug)]
pub struct DependencyGraphResult {
    pub graph: Graph<String, ()>,
}

/// Receives progress notifications while a run executes
pub trait RunObserver: Send + Sync {
    fn task_started(&self, _name: &str, _kind: TaskKind) {}

    fn task_finished(&self, _outcome: &TaskOutcome) {}

    fn task_failed(&self, _name: &str, _cause: &anyhow::Error) {}
}
