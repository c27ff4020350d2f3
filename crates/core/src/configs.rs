//! Configuration parsing for `kiln.yml`

pub mod project;

pub use project::{load_project_config, parse_project_config, ProjectConfig};
