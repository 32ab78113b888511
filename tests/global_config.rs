use std::time::Duration;

use serial_worker::{get_worker_config, set_worker_config, Job, WorkerConfig};

// Lives in its own test binary: the config can only be installed once per process.
#[test]
fn installed_config_supplies_job_defaults() {
    assert_eq!(get_worker_config(), WorkerConfig::default());

    set_worker_config(WorkerConfig::new(1200, 75, 4)).unwrap();
    assert!(set_worker_config(WorkerConfig::default()).is_err());
    assert_eq!(get_worker_config().attempts, 4);

    let job = Job::builder()
        .with_task(|| async { Ok(()) })
        .with_target(|| async { Ok(true) })
        .build()
        .unwrap();
    assert_eq!(job.faith(), Duration::from_millis(1200));
    assert_eq!(job.patience(), Duration::from_millis(75));

    let explicit = Job::builder()
        .with_task(|| async { Ok(()) })
        .with_target(|| async { Ok(true) })
        .faith_millis(10)
        .build()
        .unwrap();
    assert_eq!(explicit.faith(), Duration::from_millis(10));
    assert_eq!(explicit.patience(), Duration::from_millis(75));
}

#[test]
fn zero_attempts_cannot_be_installed() {
    let err = WorkerConfig::new(100, 10, 0).validate().unwrap_err();
    assert!(err.to_string().contains("at least 1"));
}
