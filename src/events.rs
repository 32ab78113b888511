//! Structured events emitted at every state transition of a run.
//!
//! The worker hands each [`WorkerEvent`] to an [`Observer`]. The default
//! observer, [`TracingObserver`], turns them into `tracing` records; any
//! `Fn(&WorkerEvent)` closure can be used instead to collect or forward them.

use std::io::{Stdout, Write};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkerEvent {
    RunStarted {
        run_id: String,
        jobs: usize,
        attempts: u32,
    },
    /// Result of a full-queue probe. `None` means no job is done yet.
    PositionProbed { position: Option<usize> },
    /// A target failed during a full-queue probe; counted as not done.
    StatusProbeFailed {
        index: usize,
        title: String,
        error: String,
    },
    JobStarted { index: usize, title: String },
    ProbeReturnedFalse { title: String, polls: u32 },
    ProbeRejected {
        title: String,
        polls: u32,
        error: String,
    },
    ConfirmationSucceeded {
        title: String,
        polls: u32,
        elapsed_ms: u64,
    },
    ConfirmationTimedOut {
        title: String,
        polls: u32,
        faith_ms: u64,
    },
    AttemptFailed {
        index: usize,
        title: String,
        attempts_left: u32,
    },
    AttemptsExhausted { index: usize, title: String },
    ActionFailed {
        index: usize,
        title: String,
        error: String,
    },
    RunSucceeded { run_id: String },
    RunFailed { run_id: String },
}

impl WorkerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkerEvent::RunStarted { .. } => "run_started",
            WorkerEvent::PositionProbed { .. } => "position_probed",
            WorkerEvent::StatusProbeFailed { .. } => "status_probe_failed",
            WorkerEvent::JobStarted { .. } => "job_started",
            WorkerEvent::ProbeReturnedFalse { .. } => "probe_returned_false",
            WorkerEvent::ProbeRejected { .. } => "probe_rejected",
            WorkerEvent::ConfirmationSucceeded { .. } => "confirmation_succeeded",
            WorkerEvent::ConfirmationTimedOut { .. } => "confirmation_timed_out",
            WorkerEvent::AttemptFailed { .. } => "attempt_failed",
            WorkerEvent::AttemptsExhausted { .. } => "attempts_exhausted",
            WorkerEvent::ActionFailed { .. } => "action_failed",
            WorkerEvent::RunSucceeded { .. } => "run_succeeded",
            WorkerEvent::RunFailed { .. } => "run_failed",
        }
    }
}

impl std::fmt::Display for WorkerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}


pub trait Observer: Send + Sync {
    fn notify(&self, event: &WorkerEvent);
}

impl<F> Observer for F
where
    F: Fn(&WorkerEvent) + Send + Sync,
{
    fn notify(&self, event: &WorkerEvent) {
        self(event)
    }
}


/// Writes every event as a `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn notify(&self, event: &WorkerEvent) {
        match event {
            WorkerEvent::RunStarted { run_id, jobs, attempts } => {
                info!(%run_id, jobs, attempts, "serial worker starting");
            }
            WorkerEvent::PositionProbed { position } => {
                debug!(?position, "position probed");
            }
            WorkerEvent::StatusProbeFailed { index, title, error } => {
                debug!(index, %title, %error, "status probe failed; counting job as not done");
            }
            WorkerEvent::JobStarted { index, title } => {
                info!(index, %title, "running job");
            }
            WorkerEvent::ProbeReturnedFalse { title, polls } => {
                debug!(%title, polls, "target returned false; polling again");
            }
            WorkerEvent::ProbeRejected { title, polls, error } => {
                debug!(%title, polls, %error, "target rejected; polling again");
            }
            WorkerEvent::ConfirmationSucceeded { title, polls, elapsed_ms } => {
                info!(%title, polls, elapsed_ms, "job confirmed done");
            }
            WorkerEvent::ConfirmationTimedOut { title, polls, faith_ms } => {
                warn!(%title, polls, faith_ms, "job not confirmed in time; task probably failed");
            }
            WorkerEvent::AttemptFailed { index, title, attempts_left } => {
                warn!(index, %title, attempts_left, "attempt failed; re-probing position");
            }
            WorkerEvent::AttemptsExhausted { index, title } => {
                error!(index, %title, "no attempts left");
            }
            WorkerEvent::ActionFailed { index, title, error } => {
                error!(index, %title, %error, "job task failed");
            }
            WorkerEvent::RunSucceeded { run_id } => {
                info!(%run_id, "all jobs done");
            }
            WorkerEvent::RunFailed { run_id } => {
                error!(%run_id, "serial worker gave up");
            }
        }
    }
}


/// Writes each event as one JSON line, to stdout unless told otherwise.
pub struct JsonLinesObserver<W = Stdout> {
    out: Mutex<W>,
}

impl JsonLinesObserver<Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Observer for JsonLinesObserver<W> {
    fn notify(&self, event: &WorkerEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(err) => {
                error!(event = %event, error = %err, "failed to serialize worker event");
                return;
            }
        };
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            error!(event = %event, error = %err, "failed to write worker event");
        }
    }
}
