//! Runs dependent jobs one after another, confirming each by polling.
//!
//! A [`Job`] pairs a task with a separate target that says whether the task
//! took effect. [`SerialWorker`] runs the queue in order, skipping ahead past
//! jobs whose target already holds, and confirms every task with a
//! [`CompletionMonitor`] that polls the target every `patience` until it
//! turns true or `faith` runs out.
//!
//! ```no_run
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! use serial_worker::{Job, SerialWorker};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let flag = Arc::new(AtomicBool::new(false));
//! let (setter, reader) = (Arc::clone(&flag), Arc::clone(&flag));
//!
//! let job = Job::builder()
//!     .title("set flag")
//!     .with_task(move || {
//!         setter.store(true, Ordering::SeqCst);
//!         async { Ok(()) }
//!     })
//!     .with_target(move || {
//!         let done = reader.load(Ordering::SeqCst);
//!         async move { Ok(done) }
//!     })
//!     .faith_millis(1000)
//!     .patience_millis(400)
//!     .build()?;
//!
//! let mut worker = SerialWorker::new();
//! worker.add_job(&job);
//! assert!(worker.run(1).await?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod job;
pub mod monitor;
pub mod plan;
pub mod queue;
pub mod runner;
pub mod utils;

pub use config::{get_worker_config, set_worker_config, WorkerConfig};
pub use error::WorkerError;
pub use events::{JsonLinesObserver, Observer, TracingObserver, WorkerEvent};
pub use job::{Job, JobBuilder, Task};
pub use monitor::CompletionMonitor;
pub use plan::{JobPlan, JobSpec, ShellTask};
pub use queue::JobQueue;
pub use runner::SerialWorker;
pub use utils::jconfig::JobInfo;
