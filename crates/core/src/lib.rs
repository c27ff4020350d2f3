//! kiln Core Library
//!
//! This is the core library for the kiln front-end build orchestrator. It
//! provides the task registry and runner, and the standard build pipeline
//! (`clean`, `env`, `config`, `copy-assets`, `dev`, `prod`) driving an external
//! bundler.
//!
//! ## Architecture
//!
//! The core library is organized into several modules:
//!
//! - [`build_manager`] - High-level interface used by the CLI
//! - [`registry`] - Task definitions, one-shot and service bodies
//! - [`graph`] - Immutable task graph with cycle detection
//! - [`execution`] - Execution planning and the task runner
//! - [`results`] - Run reports and progress observers
//! - [`pipeline`] - The standard build tasks and their per-run context
//! - [`environment`] - Build mode and injected environment
//! - [`bundle`] - Bundle configuration and plugin list builder
//! - [`bundler`] - The external bundler collaborator
//! - [`assets`] - Static asset copying
//! - [`service`] - The development service and asset watcher
//! - [`configs`] - `kiln.yml` parsing
//! - [`types`] - Error types and type aliases
//!
//! ## Usage
//!
//! The task core works with any context type:
//!
//! ```rust
//! use kiln_core::execution::TaskRunner;
//! use kiln_core::graph::TaskGraph;
//! use kiln_core::registry::TaskRegistry;
//!
//! # async fn example() -> Result<(), kiln_core::types::TaskError> {
//! let mut registry = TaskRegistry::new();
//! registry.register("clean", &[], |log: &mut Vec<String>| {
//!     log.push("clean".to_string());
//!     Ok(())
//! })?;
//! registry.register("build", &["clean"], |log: &mut Vec<String>| {
//!     log.push("build".to_string());
//!     Ok(())
//! })?;
//!
//! let graph = TaskGraph::build(registry)?;
//! let mut log = Vec::new();
//! TaskRunner::new(&graph).run("build", &mut log).await?;
//! assert_eq!(log, vec!["clean", "build"]);
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod build_manager;
pub mod bundle;
pub mod bundler;
pub mod configs;
pub mod environment;
pub mod execution;
pub mod graph;
pub mod pipeline;
pub mod registry;
pub mod results;
pub mod service;
pub mod types;

// Re-export the main types for easier usage
pub use build_manager::{BuildManager, BuildManagerConfig};
pub use types::{KilnError, KilnResult, TaskError};

/// Graph types used by [`results::DependencyGraphResult`]
pub use petgraph;
