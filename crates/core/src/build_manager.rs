//! High-level build management interface
//!
//! This module provides the [`BuildManager`] which serves as the primary interface
//! for everything the CLI does. It loads the project configuration, builds the
//! task graph once, and runs targets with a fresh per-run context.
//!
//! ## Example
//!
//! ```rust,no_run
//! use kiln_core::build_manager::{BuildManager, BuildManagerConfig};
//! use kiln_core::environment::BuildMode;
//! use std::path::PathBuf;
//!
//! # async fn example() -> kiln_core::types::KilnResult<()> {
//! let manager = BuildManager::new(BuildManagerConfig {
//!     project_root: PathBuf::from("."),
//!     config_path: None,
//! })?;
//!
//! // Show what `prod` would run
//! let plan = manager.get_execution_plan(&["prod"])?;
//!
//! // Run it
//! let report = manager
//!     .run(&["prod"], BuildMode::Production, Default::default(), None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::bundler::{Bundler, CommandBundler};
use crate::configs::{load_project_config, ProjectConfig};
use crate::environment::BuildMode;
use crate::execution::{ExecutionPlan, ExecutionRecord, TaskRunner, TaskRunnerConfig};
use crate::graph::TaskGraph;
use crate::pipeline::{pipeline_graph, BuildContext};
use crate::results::{DependencyGraphResult, RunObserver, RunReport, TaskInfo};
use crate::types::{KilnError, KilnResult};

/// Configuration for initializing a build manager
#[derive(Debug, Clone)]
pub struct BuildManagerConfig {
    pub project_root: PathBuf,
    /// Explicit config file; `kiln.yml` in the project root otherwise
    pub config_path: Option<PathBuf>,
}

/// Owns the task graph and project configuration for one process
pub struct BuildManager {
    pub project_root: PathBuf,
    pub project_config: ProjectConfig,
    graph: TaskGraph<BuildContext>,
    bundler: Arc<dyn Bundler>,
}

impl BuildManager {
    /// Load configuration and build the pipeline for the given project root
    pub fn new(config: BuildManagerConfig) -> KilnResult<Self> {
        let project_root = config.project_root.canonicalize().map_err(|e| {
            KilnError::Config(format!(
                "Project root {} is not accessible: {}",
                config.project_root.display(),
                e
            ))
        })?;
        let project_config = load_project_config(&project_root, config.config_path.as_deref())?;
        let bundler = Arc::new(CommandBundler::new(
            &project_root,
            project_config.bundler.clone(),
        ));

        Self::with_bundler(project_root, project_config, bundler)
    }

    /// Build a manager around an already loaded configuration and bundler
    pub fn with_bundler(
        project_root: PathBuf,
        project_config: ProjectConfig,
        bundler: Arc<dyn Bundler>,
    ) -> KilnResult<Self> {
        let graph = pipeline_graph()?;
        debug!(root = %project_root.display(), tasks = ?graph.all(), "initialized build manager");
        Ok(Self {
            project_root,
            project_config,
            graph,
            bundler,
        })
    }

    /// Registered tasks with their prerequisites, sorted by name
    pub fn list_tasks(&self) -> Vec<TaskInfo> {
        self.graph
            .tasks()
            .map(|task| TaskInfo {
                name: task.name().to_string(),
                description: task.description().map(str::to_string),
                prerequisites: task.prerequisites().to_vec(),
                kind: task.kind(),
            })
            .collect()
    }

    /// Execution order for `targets` without running anything
    pub fn get_execution_plan(&self, targets: &[&str]) -> KilnResult<ExecutionPlan> {
        Ok(TaskRunner::new(&self.graph).plan(targets, &ExecutionRecord::new())?)
    }

    pub fn get_dependency_graph(&self) -> DependencyGraphResult {
        DependencyGraphResult {
            graph: self.graph.dependency_graph().clone(),
        }
    }

    /// Run `targets` in one execution record with a fresh context
    pub async fn run(
        &self,
        targets: &[&str],
        mode: BuildMode,
        runner_config: TaskRunnerConfig,
        observer: Option<Arc<dyn RunObserver>>,
    ) -> KilnResult<RunReport> {
        let mut ctx = BuildContext::new(
            &self.project_root,
            self.project_config.clone(),
            mode,
            Arc::clone(&self.bundler),
        );
        let mut runner = TaskRunner::with_config(&self.graph, runner_config);
        if let Some(observer) = observer {
            runner = runner.with_observer(observer);
        }

        let mut record = ExecutionRecord::new();
        Ok(runner
            .run_with_record(targets, &mut record, &mut ctx)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::RecordingBundler;
    use crate::registry::TaskKind;
    use crate::types::TaskError;

    fn manager(root: PathBuf, bundler: Arc<RecordingBundler>) -> BuildManager {
        BuildManager::with_bundler(root, ProjectConfig::default(), bundler).unwrap()
    }

    #[test]
    fn test_list_tasks() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = manager(temp_dir.path().to_path_buf(), Arc::default());

        let tasks = manager.list_tasks();
        let dev = tasks.iter().find(|t| t.name == "dev").unwrap();
        assert_eq!(dev.kind, TaskKind::Service);
        assert_eq!(dev.prerequisites, vec!["clean", "config", "copy-assets"]);
        assert!(tasks.iter().all(|t| t.description.is_some()));
    }

    #[test]
    fn test_execution_plan_for_prod() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = manager(temp_dir.path().to_path_buf(), Arc::default());

        let plan = manager.get_execution_plan(&["prod"]).unwrap();
        assert_eq!(plan.order, vec!["clean", "env", "config", "copy-assets", "prod"]);
    }

    #[test]
    fn test_unknown_target_plan() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = manager(temp_dir.path().to_path_buf(), Arc::default());

        let err = manager.get_execution_plan(&["deploy"]).unwrap_err();
        assert!(matches!(err, KilnError::Task(TaskError::UnknownTask(_))));
    }

    #[test]
    fn test_dependency_graph_is_acyclic() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = manager(temp_dir.path().to_path_buf(), Arc::default());

        let result = manager.get_dependency_graph();
        assert_eq!(result.graph.node_count(), 6);
        assert_eq!(result.graph.edge_count(), 10);
        assert!(!petgraph::algo::is_cyclic_directed(&result.graph));
    }

    #[tokio::test]
    async fn test_run_prod_uses_fresh_context() {
        let temp_dir = tempfile::tempdir().unwrap();
        let bundler = Arc::new(RecordingBundler::default());
        let manager = manager(temp_dir.path().to_path_buf(), bundler.clone());

        for _ in 0..2 {
            manager
                .run(&["prod"], BuildMode::Production, TaskRunnerConfig::default(), None)
                .await
                .unwrap();
        }

        assert_eq!(bundler.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_new_rejects_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = BuildManager::new(BuildManagerConfig {
            project_root: temp_dir.path().join("missing"),
            config_path: None,
        });
        assert!(matches!(result, Err(KilnError::Config(_))));
    }
}
