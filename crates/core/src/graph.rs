use std::collections::{BTreeMap, HashMap};

use petgraph::algo::kosaraju_scc;
use petgraph::prelude::*;

use crate::registry::{Task, TaskRegistry};
use crate::types::TaskError;

/// Immutable task graph built once from a [`TaskRegistry`].
///
/// Every prerequisite is guaranteed to exist. Cycles are recorded rather than
/// rejected so they can be listed; [`TaskGraph::validate`] turns them into an
/// error and the runner refuses to run any target that reaches one.
#[derive(Debug)]
pub struct TaskGraph<C: Send> {
    tasks: BTreeMap<String, Task<C>>,
    dep_graph: DiGraph<String, ()>,
    cycles: Vec<Vec<String>>,
}

impl<C: Send> TaskGraph<C> {
    /// Freeze a registry, checking that every prerequisite is registered
    pub fn build(registry: TaskRegistry<C>) -> Result<Self, TaskError> {
        let tasks = registry.into_tasks();
        let mut dep_graph = DiGraph::<String, ()>::new();
        let mut node_indices = HashMap::new();

        for name in tasks.keys() {
            let node_index = dep_graph.add_node(name.clone());
            node_indices.insert(name.clone(), node_index);
        }

        for task in tasks.values() {
            let from_node = node_indices[task.name()];
            for prerequisite in task.prerequisites() {
                let Some(&to_node) = node_indices.get(prerequisite) else {
                    return Err(TaskError::UnknownPrerequisite {
                        task: task.name().to_string(),
                        prerequisite: prerequisite.clone(),
                    });
                };
                // task -> prerequisite (prerequisite runs first)
                dep_graph.add_edge(from_node, to_node, ());
            }
        }

        let mut cycles: Vec<Vec<String>> = kosaraju_scc(&dep_graph)
            .into_iter()
            .filter_map(|component| {
                if component.len() > 1 {
                    let mut cycle = component
                        .iter()
                        .map(|node| dep_graph[*node].clone())
                        .collect::<Vec<_>>();
                    cycle.sort();
                    Some(cycle)
                } else {
                    let node = component[0];
                    dep_graph
                        .contains_edge(node, node)
                        .then(|| vec![dep_graph[node].clone()])
                }
            })
            .collect();
        cycles.sort();

        Ok(Self {
            tasks,
            dep_graph,
            cycles,
        })
    }

    pub fn get(&self, name: &str) -> Result<&Task<C>, TaskError> {
        self.tasks
            .get(name)
            .ok_or_else(|| TaskError::UnknownTask(name.to_string()))
    }

    /// All task names, sorted
    pub fn all(&self) -> Vec<&str> {
        self.tasks.keys().map(String::as_str).collect()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task<C>> {
        self.tasks.values()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Strongly connected components that form cycles, each sorted by name
    pub fn cycles(&self) -> &[Vec<String>] {
        &self.cycles
    }

    pub fn dependency_graph(&self) -> &DiGraph<String, ()> {
        &self.dep_graph
    }

    /// Reject graphs containing any cycle
    pub fn validate(&self) -> Result<(), TaskError> {
        match self.cycles.first() {
            Some(cycle) => Err(TaskError::CyclicDependency {
                cycle: cycle.clone(),
            }),
            None => Ok(()),
        }
    }
}
