// src/job.rs
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};

use crate::config::get_worker_config;
use crate::error::WorkerError;
use crate::utils::constants::UNTITLED_JOB;

/// Runs the job once per attempt.
pub type TaskFn = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Reports whether the job's effect is visible yet.
pub type TargetFn = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<bool>> + Send + Sync>;


/// Trait form of a job, for types that own both the work and its check.
///
/// `perform` is called once per attempt. `is_done` may be called many times,
/// concurrently with the other jobs' checks, and must not have side effects.
#[async_trait]
pub trait Task: Send + Sync {
    async fn perform(&self) -> anyhow::Result<()>;

    async fn is_done(&self) -> anyhow::Result<bool>;

    fn title(&self) -> Option<String> {
        None
    }
}


/// A unit of work plus an independent probe for whether it is done.
///
/// Cloning is cheap and yields an independent value: the closures are shared
/// behind `Arc` but nothing about a job can change after `build`.
#[derive(Clone)]
pub struct Job {
    title: Option<String>,
    task: TaskFn,
    target: TargetFn,
    faith: Duration,
    patience: Duration,
}

impl Job {
    pub fn builder() -> JobBuilder {
        JobBuilder::default()
    }

    /// Builder pre-filled from a [`Task`] implementation.
    pub fn from_task<T>(task: Arc<T>) -> JobBuilder
    where
        T: Task + 'static,
    {
        let mut builder = JobBuilder::default();
        builder.title = task.title();

        let performer = Arc::clone(&task);
        let perform: TaskFn = Arc::new(move || {
            let performer = Arc::clone(&performer);
            async move { performer.perform().await }.boxed()
        });
        builder.task = Some(perform);

        let checker = task;
        let check: TargetFn = Arc::new(move || {
            let checker = Arc::clone(&checker);
            async move { checker.is_done().await }.boxed()
        });
        builder.target = Some(check);

        builder
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Title for diagnostics.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED_JOB)
    }

    /// Total time allowed for the target to turn true after the task ran.
    pub fn faith(&self) -> Duration {
        self.faith
    }

    /// Pause between two target polls.
    pub fn patience(&self) -> Duration {
        self.patience
    }

    pub fn run(&self) -> BoxFuture<'static, anyhow::Result<()>> {
        (self.task)()
    }

    pub fn is_done(&self) -> BoxFuture<'static, anyhow::Result<bool>> {
        (self.target)()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("title", &self.title)
            .field("faith", &self.faith)
            .field("patience", &self.patience)
            .finish_non_exhaustive()
    }
}


#[derive(Default)]
pub struct JobBuilder {
    title: Option<String>,
    task: Option<TaskFn>,
    target: Option<TargetFn>,
    faith: Option<Duration>,
    patience: Option<Duration>,
}

impl JobBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Work to do each time the job is attempted. The returned future must
    /// resolve once the work has been handed off.
    pub fn with_task<F, Fut>(mut self, task: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let task: TaskFn = Arc::new(move || task().boxed());
        self.task = Some(task);
        self
    }

    /// Probe for completion. Called once per position probe and repeatedly
    /// while confirming; an `Err` counts as "not done yet".
    pub fn with_target<F, Fut>(mut self, target: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        let target: TargetFn = Arc::new(move || target().boxed());
        self.target = Some(target);
        self
    }

    pub fn faith(mut self, faith: Duration) -> Self {
        self.faith = Some(faith);
        self
    }

    pub fn faith_millis(self, millis: u64) -> Self {
        self.faith(Duration::from_millis(millis))
    }

    pub fn patience(mut self, patience: Duration) -> Self {
        self.patience = Some(patience);
        self
    }

    pub fn patience_millis(self, millis: u64) -> Self {
        self.patience(Duration::from_millis(millis))
    }

    pub fn build(self) -> Result<Job, WorkerError> {
        let Some(task) = self.task else {
            return Err(WorkerError::MissingTask { title: self.title });
        };
        let Some(target) = self.target else {
            return Err(WorkerError::MissingTarget { title: self.title });
        };

        let defaults = get_worker_config();
        Ok(Job {
            title: self.title,
            task,
            target,
            faith: self.faith.unwrap_or_else(|| defaults.faith()),
            patience: self.patience.unwrap_or_else(|| defaults.patience()),
        })
    }
}
