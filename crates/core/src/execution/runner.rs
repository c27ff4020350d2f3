//! High-level task runner
//!
//! Executes a resolved [`ExecutionPlan`] one task at a time. Every body is
//! awaited before the next task starts and the first failure aborts the run.
//! Nothing is retried and completed side effects are not rolled back.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::execution::plan::{resolve_execution_plan, ExecutionPlan};
use crate::execution::record::ExecutionRecord;
use crate::graph::TaskGraph;
use crate::registry::TaskAction;
use crate::results::{RunObserver, RunReport, RunResult, TaskOutcome};
use crate::types::TaskError;

/// Configuration for the task runner
#[derive(Debug, Default, Clone)]
pub struct TaskRunnerConfig {
    /// Stops foreground services; cancelling it also prevents tasks that have
    /// not started yet from running
    pub cancellation: CancellationToken,
}

/// Runs tasks from a [`TaskGraph`] in dependency order
pub struct TaskRunner<'a, C: Send> {
    graph: &'a TaskGraph<C>,
    config: TaskRunnerConfig,
    observer: Option<Arc<dyn RunObserver>>,
}

impl<'a, C: Send> TaskRunner<'a, C> {
    pub fn new(graph: &'a TaskGraph<C>) -> Self {
        Self::with_config(graph, TaskRunnerConfig::default())
    }

    pub fn with_config(graph: &'a TaskGraph<C>, config: TaskRunnerConfig) -> Self {
        Self {
            graph,
            config,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Resolve what running `targets` would execute, given what is already done
    pub fn plan(
        &self,
        targets: &[&str],
        record: &ExecutionRecord,
    ) -> Result<ExecutionPlan, TaskError> {
        resolve_execution_plan(self.graph, targets, record.done())
    }

    /// Run a single target with a fresh execution record
    pub async fn run(&self, target: &str, ctx: &mut C) -> RunResult {
        let mut record = ExecutionRecord::new();
        self.run_with_record(&[target], &mut record, ctx).await
    }

    /// Run `targets` in order, sharing `record` so no task runs twice
    pub async fn run_with_record(
        &self,
        targets: &[&str],
        record: &mut ExecutionRecord,
        ctx: &mut C,
    ) -> RunResult {
        let started = Instant::now();
        let plan = self.plan(targets, record)?;

        let mut report = RunReport {
            targets: plan.targets.clone(),
            skipped: plan.skipped.clone(),
            ..RunReport::default()
        };

        for name in &plan.order {
            if self.config.cancellation.is_cancelled() {
                warn!(task = %name, "run cancelled before task started");
                return Err(TaskError::TaskExecution {
                    name: name.clone(),
                    cause: anyhow::anyhow!("run was cancelled before the task started"),
                });
            }

            let outcome = self.execute(name, ctx).await?;
            record.mark_done(name);
            report.executed.push(outcome);
        }

        report.elapsed = started.elapsed();
        info!(
            targets = ?report.targets,
            executed = report.executed.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "run completed"
        );
        Ok(report)
    }

    async fn execute(&self, name: &str, ctx: &mut C) -> Result<TaskOutcome, TaskError> {
        let task = self.graph.get(name)?;
        let kind = task.kind();
        if let Some(observer) = &self.observer {
            observer.task_started(name, kind);
        }

        info!(task = name, %kind, "starting task");
        let started = Instant::now();
        let result = match task.action() {
            TaskAction::OneShot(body) => body.run(ctx).await,
            TaskAction::Service(body) => {
                body.serve(ctx, self.config.cancellation.child_token()).await
            }
        };

        match result {
            Ok(()) => {
                let outcome = TaskOutcome {
                    name: name.to_string(),
                    kind,
                    elapsed: started.elapsed(),
                };
                debug!(
                    task = name,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "task finished"
                );
                if let Some(observer) = &self.observer {
                    observer.task_finished(&outcome);
                }
                Ok(outcome)
            }
            Err(cause) => {
                warn!(task = name, error = %cause, "task failed");
                if let Some(observer) = &self.observer {
                    observer.task_failed(name, &cause);
                }
                Err(TaskError::TaskExecution {
                    name: name.to_string(),
                    cause,
                })
            }
        }
    }
}
