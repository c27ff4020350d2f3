//! Task registry
//!
//! Tasks are registered by name together with their prerequisites and a body.
//! A body is either a one-shot unit of work ([`TaskBody`]) or a foreground
//! service ([`ServiceBody`]) that keeps running until its cancellation token
//! fires.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::types::TaskError;

/// A one-shot unit of build work
#[async_trait]
pub trait TaskBody<C: Send>: Send + Sync {
    async fn run(&self, ctx: &mut C) -> anyhow::Result<()>;
}

/// Plain closures are one-shot bodies
#[async_trait]
impl<C, F> TaskBody<C> for F
where
    C: Send,
    F: Fn(&mut C) -> anyhow::Result<()> + Send + Sync,
{
    async fn run(&self, ctx: &mut C) -> anyhow::Result<()> {
        self(ctx)
    }
}

/// A long-running body that only completes once `cancel` fires.
///
/// Implementations must release everything they acquired (watchers, child
/// processes, sockets) before returning.
#[async_trait]
pub trait ServiceBody<C: Send>: Send + Sync {
    async fn serve(&self, ctx: &mut C, cancel: CancellationToken) -> anyhow::Result<()>;
}

/// What a task does when it runs
pub enum TaskAction<C: Send> {
    OneShot(Box<dyn TaskBody<C>>),
    Service(Box<dyn ServiceBody<C>>),
}

impl<C: Send> TaskAction<C> {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskAction::OneShot(_) => TaskKind::OneShot,
            TaskAction::Service(_) => TaskKind::Service,
        }
    }
}

impl<C: Send> fmt::Debug for TaskAction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskAction::{}", self.kind())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    OneShot,
    Service,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::OneShot => write!(f, "one-shot"),
            TaskKind::Service => write!(f, "service"),
        }
    }
}

/// A named task with its prerequisites
#[derive(Debug)]
pub struct Task<C: Send> {
    name: String,
    description: Option<String>,
    prerequisites: Vec<String>,
    action: TaskAction<C>,
}

impl<C: Send> Task<C> {
    pub fn new(name: impl Into<String>, prerequisites: &[&str], action: TaskAction<C>) -> Self {
        Self {
            name: name.into(),
            description: None,
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
            action,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Prerequisites in declared order
    pub fn prerequisites(&self) -> &[String] {
        &self.prerequisites
    }

    pub fn action(&self) -> &TaskAction<C> {
        &self.action
    }

    pub fn kind(&self) -> TaskKind {
        self.action.kind()
    }
}

/// Mutable collection of task definitions, frozen into a
/// [`TaskGraph`](crate::graph::TaskGraph) before anything runs
#[derive(Debug)]
pub struct TaskRegistry<C: Send> {
    tasks: BTreeMap<String, Task<C>>,
}

impl<C: Send> Default for TaskRegistry<C> {
    fn default() -> Self {
        Self {
            tasks: BTreeMap::new(),
        }
    }
}

impl<C: Send> TaskRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a one-shot task
    pub fn register<B>(
        &mut self,
        name: &str,
        prerequisites: &[&str],
        body: B,
    ) -> Result<(), TaskError>
    where
        B: TaskBody<C> + 'static,
    {
        self.insert(Task::new(name, prerequisites, TaskAction::OneShot(Box::new(body))))
    }

    /// Register a foreground service task
    pub fn register_service<B>(
        &mut self,
        name: &str,
        prerequisites: &[&str],
        body: B,
    ) -> Result<(), TaskError>
    where
        B: ServiceBody<C> + 'static,
    {
        self.insert(Task::new(name, prerequisites, TaskAction::Service(Box::new(body))))
    }

    /// Register a fully built task
    pub fn insert(&mut self, task: Task<C>) -> Result<(), TaskError> {
        if self.tasks.contains_key(task.name()) {
            return Err(TaskError::DuplicateTask(task.name.clone()));
        }
        self.tasks.insert(task.name.clone(), task);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Task<C>, TaskError> {
        self.tasks
            .get(name)
            .ok_or_else(|| TaskError::UnknownTask(name.to_string()))
    }

    /// All registered names, sorted
    pub fn all(&self) -> Vec<&str> {
        self.tasks.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(crate) fn into_tasks(self) -> BTreeMap<String, Task<C>> {
        self.tasks
    }
}
