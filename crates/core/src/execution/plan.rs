//! Execution planning
//!
//! Resolves the transitive prerequisites of a set of targets into the exact
//! order the runner will execute them in. Planning happens before any body
//! runs, so an unknown name or a cycle anywhere below a target aborts the run
//! without side effects.

use std::collections::HashSet;

use tracing::debug;

use crate::graph::TaskGraph;
use crate::types::TaskError;

/// Ordered list of tasks a run will execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub targets: Vec<String>,
    /// Tasks to execute, prerequisites first
    pub order: Vec<String>,
    /// Reachable tasks that were already done and will not run again
    pub skipped: Vec<String>,
}

/// Depth-first resolution over `done`, `in_progress` and `pending`
struct Resolver<'a, C: Send> {
    graph: &'a TaskGraph<C>,
    done: &'a HashSet<String>,
    /// Current DFS path, used to name the cycle when one is found
    in_progress: Vec<String>,
    pending: HashSet<String>,
    order: Vec<String>,
    skipped: Vec<String>,
}

impl<C: Send> Resolver<'_, C> {
    fn visit(&mut self, name: &str) -> Result<(), TaskError> {
        if self.done.contains(name) {
            if !self.skipped.iter().any(|s| s == name) {
                self.skipped.push(name.to_string());
            }
            return Ok(());
        }
        if self.pending.contains(name) {
            return Ok(());
        }
        if let Some(pos) = self.in_progress.iter().position(|n| n == name) {
            let mut cycle = self.in_progress[pos..].to_vec();
            cycle.push(name.to_string());
            return Err(TaskError::CyclicDependency { cycle });
        }

        let task = self.graph.get(name)?;
        self.in_progress.push(name.to_string());
        for prerequisite in task.prerequisites() {
            self.visit(prerequisite)?;
        }
        self.in_progress.pop();

        self.pending.insert(name.to_string());
        self.order.push(name.to_string());
        Ok(())
    }
}

/// Resolve the execution order for `targets`, skipping anything in `done`
pub fn resolve_execution_plan<C: Send>(
    graph: &TaskGraph<C>,
    targets: &[&str],
    done: &HashSet<String>,
) -> Result<ExecutionPlan, TaskError> {
    let mut resolver = Resolver {
        graph,
        done,
        in_progress: Vec::new(),
        pending: HashSet::new(),
        order: Vec::new(),
        skipped: Vec::new(),
    };

    for target in targets {
        resolver.visit(target)?;
    }

    debug!(targets = ?targets, order = ?resolver.order, "resolved execution plan");

    Ok(ExecutionPlan {
        targets: targets.iter().map(|t| t.to_string()).collect(),
        order: resolver.order,
        skipped: resolver.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TaskRegistry;

    fn noop(_: &mut ()) -> anyhow::Result<()> {
        Ok(())
    }

    fn graph(edges: &[(&str, &[&str])]) -> TaskGraph<()> {
        let mut registry = TaskRegistry::new();
        for (name, prerequisites) in edges {
            registry.register(name, prerequisites, noop).unwrap();
        }
        TaskGraph::build(registry).unwrap()
    }

    fn pipeline() -> TaskGraph<()> {
        graph(&[
            ("clean", &[]),
            ("env", &[]),
            ("config", &["env"]),
            ("copyAssets", &[]),
            ("dev", &["clean", "config", "copyAssets"]),
            ("prod", &["clean", "env", "config", "copyAssets"]),
        ])
    }

    #[test]
    fn test_dev_plan_order() {
        let plan = resolve_execution_plan(&pipeline(), &["dev"], &HashSet::new()).unwrap();
        assert_eq!(plan.order, vec!["clean", "env", "config", "copyAssets", "dev"]);
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn test_shared_prerequisites_planned_once() {
        let plan =
            resolve_execution_plan(&pipeline(), &["dev", "prod"], &HashSet::new()).unwrap();
        assert_eq!(
            plan.order,
            vec!["clean", "env", "config", "copyAssets", "dev", "prod"]
        );
    }

    #[test]
    fn test_done_tasks_are_skipped() {
        let done: HashSet<String> = ["clean".to_string(), "env".to_string()].into();
        let plan = resolve_execution_plan(&pipeline(), &["prod"], &done).unwrap();
        assert_eq!(plan.order, vec!["config", "copyAssets", "prod"]);
        assert_eq!(plan.skipped, vec!["clean", "env"]);
    }

    #[test]
    fn test_cycle_is_named_in_path_order() {
        let graph = graph(&[("dev", &["a"]), ("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let err = resolve_execution_plan(&graph, &["dev"], &HashSet::new()).unwrap_err();
        match err {
            TaskError::CyclicDependency { cycle } => {
                assert_eq!(cycle, vec!["a", "b", "c", "a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_target() {
        let err = resolve_execution_plan(&pipeline(), &["deploy"], &HashSet::new()).unwrap_err();
        assert!(matches!(err, TaskError::UnknownTask(name) if name == "deploy"));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let graph = graph(&[
            ("base", &[]),
            ("left", &["base"]),
            ("right", &["base"]),
            ("top", &["left", "right"]),
        ]);
        let plan = resolve_execution_plan(&graph, &["top"], &HashSet::new()).unwrap();
        assert_eq!(plan.order, vec!["base", "left", "right", "top"]);
    }
}
