use std::sync::Arc;

use anyhow::Result;
use colored::*;
use kiln_core::build_manager::BuildManager;
use kiln_core::environment::BuildMode;
use kiln_core::execution::TaskRunnerConfig;
use tracing::info;

use crate::reporter::ConsoleReporter;

pub async fn execute(manager: &BuildManager, tasks: &[String], mode: BuildMode) -> Result<()> {
    let targets: Vec<&str> = tasks.iter().map(String::as_str).collect();
    println!(
        "{} {} {}",
        "Running".bold(),
        targets.join(", ").cyan(),
        format!("({})", mode).dimmed()
    );

    // Ctrl-C stops foreground services and anything not yet started
    let runner_config = TaskRunnerConfig::default();
    let cancellation = runner_config.cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping");
            cancellation.cancel();
        }
    });

    let report = manager
        .run(&targets, mode, runner_config, Some(Arc::new(ConsoleReporter)))
        .await?;

    println!();
    if !report.skipped.is_empty() {
        println!(
            "{} {}",
            "Already done:".bright_black(),
            report.skipped.join(", ").bright_black()
        );
    }
    println!(
        "{} {}",
        "✓".green().bold(),
        format!(
            "{} task(s) completed in {} ms",
            report.executed.len(),
            report.elapsed.as_millis()
        )
        .green()
        .bold()
    );

    Ok(())
}
