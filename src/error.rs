//! Errors that cross the worker boundary.
//!
//! Probe failures and confirmation timeouts never show up here: they are
//! folded into the boolean outcome of `SerialWorker::run`.

use thiserror::Error;

use crate::utils::constants::UNTITLED_JOB;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("job {} has no task; call with_task before build", label(.title))]
    MissingTask { title: Option<String> },

    #[error("job {} has no target; call with_target before build", label(.title))]
    MissingTarget { title: Option<String> },

    /// A job's task returned an error. Never retried.
    #[error("job #{index} ({title}) failed while running its task")]
    ActionFailed {
        index: usize,
        title: String,
        #[source]
        source: anyhow::Error,
    },
}

impl WorkerError {
    /// Index of the job whose task failed, if that is what happened.
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            WorkerError::ActionFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

fn label(title: &Option<String>) -> String {
    match title {
        Some(title) => format!("{title:?}"),
        None => UNTITLED_JOB.to_string(),
    }
}
