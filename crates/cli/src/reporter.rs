//! Terminal progress output for task runs

use colored::*;
use kiln_core::registry::TaskKind;
use kiln_core::results::{RunObserver, TaskOutcome};

/// Get a consistent color for a task name
pub fn get_task_color(task_name: &str) -> Color {
    let hash = task_name
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));

    // Jewel tones, kept away from the red/yellow/green used for status
    let colors = [
        Color::TrueColor {
            r: 147,
            g: 112,
            b: 219,
        },
        Color::TrueColor {
            r: 64,
            g: 224,
            b: 208,
        },
        Color::TrueColor {
            r: 255,
            g: 140,
            b: 0,
        },
        Color::TrueColor {
            r: 199,
            g: 21,
            b: 133,
        },
        Color::TrueColor {
            r: 72,
            g: 209,
            b: 204,
        },
        Color::TrueColor {
            r: 138,
            g: 43,
            b: 226,
        },
    ];

    colors[(hash % colors.len() as u64) as usize]
}

/// Prints a header when each task starts and a status line when it ends
pub struct ConsoleReporter;

impl RunObserver for ConsoleReporter {
    fn task_started(&self, name: &str, kind: TaskKind) {
        println!();
        println!(
            "┌─ {} {}",
            "Running task".bold(),
            name.color(get_task_color(name)).bold()
        );
        if kind == TaskKind::Service {
            println!("└─ {}", "Serving until interrupted (Ctrl-C to stop)".bright_black());
        }
    }

    fn task_finished(&self, outcome: &TaskOutcome) {
        println!(
            "{} {} {}",
            "✓".green().bold(),
            format!("Completed {}", outcome.name).color(get_task_color(&outcome.name)),
            format!("({} ms)", outcome.elapsed.as_millis()).dimmed()
        );
    }

    fn task_failed(&self, name: &str, _cause: &anyhow::Error) {
        println!(
            "{} {}",
            "✗".red().bold(),
            format!("Task '{}' failed", name).red()
        );
    }
}
