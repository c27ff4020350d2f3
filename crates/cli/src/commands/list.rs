use anyhow::Result;
use colored::*;
use kiln_core::build_manager::BuildManager;
use kiln_core::registry::TaskKind;

use crate::reporter::get_task_color;

pub fn execute(manager: &BuildManager) -> Result<()> {
    println!("{}", "Tasks".bold().underline());

    let tasks = manager.list_tasks();
    if tasks.is_empty() {
        println!("  {}", "No tasks registered".dimmed());
        return Ok(());
    }

    for task in tasks {
        let kind = match task.kind {
            TaskKind::Service => " [service]".yellow(),
            TaskKind::OneShot => "".normal(),
        };
        println!("{}{}", task.name.color(get_task_color(&task.name)).bold(), kind);
        if let Some(description) = &task.description {
            println!("  {}", description.dimmed());
        }
        if !task.prerequisites.is_empty() {
            println!("  {} {}", "requires:".dimmed(), task.prerequisites.join(", "));
        }
    }

    Ok(())
}
