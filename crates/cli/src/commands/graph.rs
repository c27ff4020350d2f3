use anyhow::Result;
use colored::*;
use kiln_core::build_manager::BuildManager;
use kiln_core::petgraph::graph::{Graph, NodeIndex};

use crate::reporter::get_task_color;

/// Print each task followed by the tree of prerequisites it pulls in
pub fn execute(manager: &BuildManager) -> Result<()> {
    println!("{}", "Task Dependency Graph".bold().underline());

    let graph = manager.get_dependency_graph().graph;
    let mut roots: Vec<_> = graph.node_indices().collect();
    roots.sort_by(|a, b| graph[*a].cmp(&graph[*b]));

    for root in roots {
        println!("{}", graph[root].color(get_task_color(&graph[root])).bold());
        print_prerequisites(&graph, root, "");
        println!();
    }

    Ok(())
}

fn print_prerequisites(graph: &Graph<String, ()>, node: NodeIndex, indent: &str) {
    // Neighbors come back most recent edge first, i.e. reversed declaration order
    let mut prerequisites: Vec<_> = graph.neighbors(node).collect();
    prerequisites.reverse();

    let count = prerequisites.len();
    for (position, prerequisite) in prerequisites.into_iter().enumerate() {
        let last = position + 1 == count;
        let branch = if last { "└─" } else { "├─" };
        println!("{}{} {}", indent, branch.dimmed(), graph[prerequisite]);
        let child_indent = format!("{}{}", indent, if last { "   " } else { "│  " });
        print_prerequisites(graph, prerequisite, &child_indent);
    }
}
