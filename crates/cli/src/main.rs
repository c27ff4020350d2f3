use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use kiln_core::build_manager::{BuildManager, BuildManagerConfig};
use kiln_core::environment::BuildMode;
use kiln_core::pipeline::{DEV, PROD};
use tracing_subscriber::EnvFilter;

mod commands;
mod reporter;

/// kiln - A front-end build orchestrator
#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Run front-end build tasks in dependency order")]
#[command(version)]
struct Cli {
    /// Path to the project root (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    project: PathBuf,

    /// Configuration file (defaults to kiln.yml in the project root)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one or more tasks and their prerequisites
    Run {
        /// Task names, e.g. "prod" or "clean copy-assets"
        #[arg(required = true)]
        tasks: Vec<String>,
        /// Build mode; defaults to production when "prod" is among the tasks
        #[arg(short, long)]
        mode: Option<BuildMode>,
    },
    /// Start the development server (runs until Ctrl-C)
    Dev,
    /// Build for production
    Prod,
    /// Show execution order for tasks without running them
    Plan {
        #[arg(required = true)]
        tasks: Vec<String>,
    },
    /// List registered tasks
    List,
    /// Show the task dependency graph
    Graph,
    /// Print the JSON schema of kiln.yml
    Schema,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

async fn execute(cli: Cli) -> Result<()> {
    if let Commands::Schema = cli.command {
        return commands::schema::execute();
    }

    // Initialize build manager with all business logic
    let manager = BuildManager::new(BuildManagerConfig {
        project_root: cli.project,
        config_path: cli.config,
    })
    .map_err(|e| anyhow::anyhow!("Failed to initialize project: {}", e))?;

    // Execute command (CLI layer only handles presentation)
    match cli.command {
        Commands::Run { tasks, mode } => {
            let mode = match mode {
                Some(mode) => mode,
                None => BuildMode::for_targets(tasks.as_slice())
                    .map_err(|e| anyhow::anyhow!("{} (use --mode)", e))?,
            };
            commands::run::execute(&manager, &tasks, mode).await
        }
        Commands::Dev => {
            commands::run::execute(&manager, &[DEV.to_string()], BuildMode::Development).await
        }
        Commands::Prod => {
            commands::run::execute(&manager, &[PROD.to_string()], BuildMode::Production).await
        }
        Commands::Plan { tasks } => commands::plan::execute(&manager, &tasks),
        Commands::List => commands::list::execute(&manager),
        Commands::Graph => commands::graph::execute(&manager),
        Commands::Schema => commands::schema::execute(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = execute(cli).await {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}
