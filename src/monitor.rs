// src/monitor.rs
use std::sync::Arc;

use tokio::time::{sleep, timeout, Instant};

use crate::events::{Observer, WorkerEvent};
use crate::job::Job;


/// Decides whether a job's task actually took effect.
///
/// `confirm` polls the job's target, waiting `patience` after every false or
/// failed answer, until the target says true or `faith` has elapsed since the
/// call. Only one poll is in flight at a time. Once the deadline passes the
/// poll loop is dropped, which cancels any in-flight target call and
/// schedules nothing further.
pub struct CompletionMonitor {
    observer: Arc<dyn Observer>,
}

impl CompletionMonitor {
    pub fn new(observer: Arc<dyn Observer>) -> Self {
        Self { observer }
    }

    pub async fn confirm(&self, job: &Job) -> bool {
        let title = job.label().to_string();
        let started = Instant::now();
        let mut polls: u32 = 0;

        let polling = async {
            loop {
                let outcome = job.is_done().await;
                polls = polls.saturating_add(1);
                match outcome {
                    Ok(true) => return,
                    Ok(false) => self.observer.notify(&WorkerEvent::ProbeReturnedFalse {
                        title: title.clone(),
                        polls,
                    }),
                    Err(err) => self.observer.notify(&WorkerEvent::ProbeRejected {
                        title: title.clone(),
                        polls,
                        error: format!("{err:#}"),
                    }),
                }
                sleep(job.patience()).await;
            }
        };
        let confirmed = timeout(job.faith(), polling).await.is_ok();

        if confirmed {
            self.observer.notify(&WorkerEvent::ConfirmationSucceeded {
                title,
                polls,
                elapsed_ms: millis(started.elapsed()),
            });
        } else {
            self.observer.notify(&WorkerEvent::ConfirmationTimedOut {
                title,
                polls,
                faith_ms: millis(job.faith()),
            });
        }
        confirmed
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::anyhow;

    use crate::events::TracingObserver;

    fn monitor() -> CompletionMonitor {
        CompletionMonitor::new(Arc::new(TracingObserver))
    }

    fn recording() -> (CompletionMonitor, Arc<Mutex<Vec<WorkerEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let observer = move |event: &WorkerEvent| sink.lock().unwrap().push(event.clone());
        (CompletionMonitor::new(Arc::new(observer)), events)
    }

    #[tokio::test(start_paused = true)]
    async fn confirms_on_first_true() {
        let job = Job::builder()
            .with_task(|| async { Ok(()) })
            .with_target(|| async { Ok(true) })
            .faith_millis(1000)
            .patience_millis(400)
            .build()
            .unwrap();

        let started = Instant::now();
        assert!(monitor().confirm(&job).await);
        assert!(started.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_target_never_turns_true() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let job = Job::builder()
            .title("never")
            .with_task(|| async { Ok(()) })
            .with_target(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(false) }
            })
            .faith_millis(300)
            .patience_millis(100)
            .build()
            .unwrap();

        let (monitor, events) = recording();
        let started = Instant::now();
        assert!(!monitor.confirm(&job).await);

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(400), "{elapsed:?}");
        // polled at 0, 100 and 200 ms at least; never more often than patience allows
        let calls = calls.load(Ordering::SeqCst);
        assert!((3..=4).contains(&calls), "{calls}");

        let events = events.lock().unwrap();
        assert!(matches!(
            events.last(),
            Some(WorkerEvent::ConfirmationTimedOut { title, faith_ms: 300, .. }) if title == "never"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_target_counts_as_false_and_polling_continues() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let job = Job::builder()
            .title("flaky")
            .with_task(|| async { Ok(()) })
            .with_target(move || {
                let call = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    match call {
                        0 => Err(anyhow!("connection reset")),
                        1 => Ok(false),
                        _ => Ok(true),
                    }
                }
            })
            .faith_millis(1000)
            .patience_millis(100)
            .build()
            .unwrap();

        let (monitor, events) = recording();
        let started = Instant::now();
        assert!(monitor.confirm(&job).await);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(300), "{elapsed:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let events = events.lock().unwrap();
        assert!(matches!(
            &events[0],
            WorkerEvent::ProbeRejected { polls: 1, error, .. } if error.contains("connection reset")
        ));
        assert!(matches!(&events[1], WorkerEvent::ProbeReturnedFalse { polls: 2, .. }));
        assert!(matches!(
            &events[2],
            WorkerEvent::ConfirmationSucceeded { polls: 3, elapsed_ms, .. } if (200..300).contains(elapsed_ms)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_target_is_abandoned_at_the_deadline() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let job = Job::builder()
            .with_task(|| async { Ok(()) })
            .with_target(move || {
                let flag = Arc::clone(&flag);
                async move {
                    sleep(Duration::from_secs(10)).await;
                    flag.store(true, Ordering::SeqCst);
                    Ok(true)
                }
            })
            .faith_millis(500)
            .patience_millis(100)
            .build()
            .unwrap();

        let started = Instant::now();
        assert!(!monitor().confirm(&job).await);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(500), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(600), "{elapsed:?}");

        sleep(Duration::from_secs(20)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }
}
