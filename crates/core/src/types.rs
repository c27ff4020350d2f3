use thiserror::Error;

/// Errors raised while registering, resolving or running tasks
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("Task '{0}' not found")]
    UnknownTask(String),

    #[error("Task '{task}' depends on '{prerequisite}' which was not found")]
    UnknownPrerequisite { task: String, prerequisite: String },

    #[error("Circular dependency detected: {}", format_cycle(.cycle))]
    CyclicDependency { cycle: Vec<String> },

    /// The cause chain is rendered into the message, not exposed as a source
    #[error("Task '{name}' failed: {cause:#}")]
    TaskExecution { name: String, cause: anyhow::Error },
}

impl TaskError {
    /// Name of the task that failed, if this error came from a task body
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            TaskError::TaskExecution { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Render a cycle as `a -> b -> a`
pub fn format_cycle(cycle: &[String]) -> String {
    let mut path = cycle.to_vec();
    if let Some(first) = path.first().cloned() {
        if path.last() != Some(&first) || path.len() == 1 {
            path.push(first);
        }
    }
    path.join(" -> ")
}

/// The main error type for kiln operations
#[derive(Debug, Error)]
pub enum KilnError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Result type alias for kiln operations
pub type KilnResult<T> = Result<T, KilnError>;
