use std::sync::Arc;

use futures::future::join_all;
use nanoid::nanoid;
use tracing::{info_span, Instrument};

use crate::error::WorkerError;
use crate::events::{Observer, TracingObserver, WorkerEvent};
use crate::job::Job;
use crate::monitor::CompletionMonitor;
use crate::queue::JobQueue;
use crate::utils::jconfig::JobInfo;


/// Runs a queue of jobs strictly in order, confirming each one before
/// moving on.
///
/// A run starts from the furthest job whose target already reports done, so
/// work satisfied out of band is never redone. A confirmation that times out
/// costs one attempt from the run-wide budget and triggers a fresh probe of
/// the whole queue. A task that returns an error ends the run immediately.
pub struct SerialWorker {
    queue: JobQueue,
    observer: Arc<dyn Observer>,
    monitor: CompletionMonitor,
}

impl Default for SerialWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialWorker {
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }

    pub fn with_observer(observer: Arc<dyn Observer>) -> Self {
        Self {
            queue: JobQueue::new(),
            monitor: CompletionMonitor::new(Arc::clone(&observer)),
            observer,
        }
    }

    /// Appends a copy of `job`; later changes to the caller's value cannot
    /// reach the queue.
    pub fn add_job(&mut self, job: &Job) {
        self.queue.push(job);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn jobs(&self) -> Vec<JobInfo> {
        self.queue.infos()
    }

    /// Index of the last job whose target currently reports done.
    ///
    /// Every target is called at once and the answer is taken only after all
    /// of them settled, however long that takes. A target that errors counts
    /// as not done. Earlier jobs are not required to be done for a later one
    /// to win.
    pub async fn status(&self) -> Option<usize> {
        let probes = self.queue.iter().enumerate().map(|(index, job)| async move {
            match job.is_done().await {
                Ok(done) => done,
                Err(err) => {
                    self.observer.notify(&WorkerEvent::StatusProbeFailed {
                        index,
                        title: job.label().to_string(),
                        error: format!("{err:#}"),
                    });
                    false
                }
            }
        });
        let done = join_all(probes).await;

        let position = done.iter().rposition(|done| *done);
        self.observer
            .notify(&WorkerEvent::PositionProbed { position });
        position
    }

    /// Drives the queue to completion.
    ///
    /// Returns `Ok(true)` once the last job is confirmed (immediately for an
    /// empty queue) and `Ok(false)` when `attempts` confirmations have failed.
    /// A task error is returned as [`WorkerError::ActionFailed`] without
    /// being charged to the budget. At least one attempt is always made, so
    /// `0` behaves like `1`.
    pub async fn run(&self, attempts: u32) -> Result<bool, WorkerError> {
        let run_id = nanoid!(10);
        let span = info_span!("serial_worker.run", run_id = %run_id);
        self.drive(run_id, attempts).instrument(span).await
    }

    async fn drive(&self, run_id: String, mut attempts_left: u32) -> Result<bool, WorkerError> {
        let Some(last) = self.queue.last_index() else {
            self.observer.notify(&WorkerEvent::RunSucceeded { run_id });
            return Ok(true);
        };

        self.observer.notify(&WorkerEvent::RunStarted {
            run_id: run_id.clone(),
            jobs: self.queue.len(),
            attempts: attempts_left,
        });

        let mut position = self.status().await;
        loop {
            let index = position.map_or(0, |done| done + 1);
            if index > last {
                break;
            }
            let job = &self.queue[index];
            let title = job.label().to_string();

            self.observer.notify(&WorkerEvent::JobStarted {
                index,
                title: title.clone(),
            });
            if let Err(source) = job.run().await {
                self.observer.notify(&WorkerEvent::ActionFailed {
                    index,
                    title: title.clone(),
                    error: format!("{source:#}"),
                });
                return Err(WorkerError::ActionFailed {
                    index,
                    title,
                    source,
                });
            }

            if self.monitor.confirm(job).await {
                position = Some(index);
                continue;
            }

            attempts_left = attempts_left.saturating_sub(1);
            if attempts_left == 0 {
                self.observer
                    .notify(&WorkerEvent::AttemptsExhausted { index, title });
                self.observer.notify(&WorkerEvent::RunFailed { run_id });
                return Ok(false);
            }

            self.observer.notify(&WorkerEvent::AttemptFailed {
                index,
                title,
                attempts_left,
            });
            position = self.status().await;
        }

        self.observer.notify(&WorkerEvent::RunSucceeded { run_id });
        Ok(true)
    }
}
