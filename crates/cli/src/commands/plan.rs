use anyhow::Result;
use colored::*;
use kiln_core::build_manager::BuildManager;

pub fn execute(manager: &BuildManager, tasks: &[String]) -> Result<()> {
    let targets: Vec<&str> = tasks.iter().map(String::as_str).collect();
    println!("{} {}", "Execution plan for".bold(), targets.join(", ").cyan());

    let execution_plan = manager
        .get_execution_plan(&targets)
        .map_err(|e| anyhow::anyhow!("Failed to get execution plan: {}", e))?;

    println!("\n{}:", "Execution order".bold());
    for (i, task) in execution_plan.order.iter().enumerate() {
        println!("  {}. {}", i + 1, task);
    }

    Ok(())
}
