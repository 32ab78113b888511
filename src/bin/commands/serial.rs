// src/bin/commands/serial.rs
use clap::ArgMatches;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use anyhow::{anyhow, Result};
use colored::*;

use serial_worker::{
    set_worker_config, JobPlan, JsonLinesObserver, Observer, TracingObserver, WorkerConfig,
    WorkerError,
};

// Exit codes: 0 all confirmed, 1 attempts exhausted, 2 a task failed.
const EXIT_SUCCESS: i32 = 0;
const EXIT_EXHAUSTED: i32 = 1;
const EXIT_TASK_FAILED: i32 = 2;

struct Loaded {
    plan: JobPlan,
    config: WorkerConfig,
    base: PathBuf,
}

async fn load(matches: &ArgMatches) -> Result<Loaded> {
    let config = WorkerConfig::from_env()?;
    set_worker_config(config.clone())?;

    let path = matches
        .get_one::<String>("plan")
        .ok_or_else(|| anyhow!("missing plan path"))?;
    let plan = JobPlan::load(path).await?;

    let base = match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok(Loaded { plan, config, base })
}

// Run every job of a plan
pub async fn run_command(matches: &ArgMatches) -> Result<()> {
    let Loaded { plan, config, base } = load(matches).await?;

    let attempts = matches
        .get_one::<u32>("attempts")
        .copied()
        .or(plan.attempts)
        .unwrap_or(config.attempts);

    let observer: Arc<dyn Observer> = if matches.get_flag("json-events") {
        Arc::new(JsonLinesObserver::stdout())
    } else {
        Arc::new(TracingObserver)
    };
    let worker = plan.worker(&base, observer)?;

    eprintln!("{}", format!("Running {} job(s), {} attempt(s)", worker.len(), attempts).bold());

    let outcome = worker.run(attempts).await;
    match &outcome {
        Ok(true) => eprintln!("{}", "All jobs confirmed.".green().bold()),
        Ok(false) => eprintln!("{}", "Gave up: no attempts left.".red().bold()),
        Err(err) => eprintln!("{} {}", "Task failed:".red().bold(), error_chain(err)),
    }

    match exit_code(&outcome) {
        EXIT_SUCCESS => Ok(()),
        code => process::exit(code),
    }
}

fn exit_code(outcome: &std::result::Result<bool, WorkerError>) -> i32 {
    match outcome {
        Ok(true) => EXIT_SUCCESS,
        Ok(false) => EXIT_EXHAUSTED,
        Err(_) => EXIT_TASK_FAILED,
    }
}

// Display of the error followed by its causes.
fn error_chain(err: &WorkerError) -> String {
    let mut message = err.to_string();
    let mut cause = std::error::Error::source(err);
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}

// List the queue a plan would build
pub async fn list_command(matches: &ArgMatches) -> Result<()> {
    let Loaded { plan, base, .. } = load(matches).await?;
    let worker = plan.worker(&base, Arc::new(TracingObserver))?;
    let jobs = worker.jobs();

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }

    if jobs.is_empty() {
        println!("{}", "No jobs in plan.".blue());
        return Ok(());
    }

    println!("{:<6} {:<40} {:>10} {:>12}", "#".bold(), "TITLE".bold(), "FAITH".bold(), "PATIENCE".bold());
    for info in jobs {
        println!(
            "{:<6} {:<40} {:>8}ms {:>10}ms",
            info.index,
            info.title.as_deref().unwrap_or("-"),
            info.faith_ms,
            info.patience_ms
        );
    }
    Ok(())
}

// Probe a plan once without running anything
pub async fn status_command(matches: &ArgMatches) -> Result<()> {
    let Loaded { plan, base, .. } = load(matches).await?;
    let worker = plan.worker(&base, Arc::new(TracingObserver))?;

    match worker.status().await {
        Some(position) if position + 1 == worker.len() => {
            println!("{}", "Every job is done.".green());
        }
        Some(position) => {
            println!("Done up to job #{position}; {} job(s) left.", worker.len() - position - 1);
        }
        None => {
            println!("{}", format!("No job done yet; {} job(s) left.", worker.len()).yellow());
        }
    }
    Ok(())
}
