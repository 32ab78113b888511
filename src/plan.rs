//! JSON job plans whose tasks and targets are shell commands.
//!
//! ```json
//! {
//!   "attempts": 2,
//!   "jobs": [
//!     { "title": "make dir", "run": "mkdir -p out", "check": "test -d out" },
//!     { "title": "stamp", "run": "touch out/stamp", "check": "test -f out/stamp",
//!       "faith_ms": 1000, "patience_ms": 100 }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::events::Observer;
use crate::job::{Job, Task};
use crate::runner::SerialWorker;


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    pub jobs: Vec<JobSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Shell command run once per attempt; a non-zero exit is fatal.
    pub run: String,
    /// Shell command whose zero exit status means the job is done.
    pub check: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faith_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patience_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
}

impl JobPlan {
    pub fn from_json(raw: &str) -> Result<Self> {
        let plan: Self = serde_json::from_str(raw).context("Invalid job plan")?;
        plan.validate()?;
        Ok(plan)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read job plan {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Failed to load job plan {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.attempts == Some(0) {
            bail!("attempts must be at least 1");
        }
        for (index, spec) in self.jobs.iter().enumerate() {
            if spec.run.trim().is_empty() {
                return Err(anyhow!("job #{index} has an empty run command"));
            }
            if spec.check.trim().is_empty() {
                return Err(anyhow!("job #{index} has an empty check command"));
            }
        }
        Ok(())
    }

    /// Builds the jobs of this plan, resolving relative workdirs against `base`.
    pub fn jobs(&self, base: &Path) -> Result<Vec<Job>> {
        self.jobs
            .iter()
            .map(|spec| {
                let task = Arc::new(ShellTask::from_spec(spec, base));
                let mut builder = Job::from_task(task);
                if let Some(faith) = spec.faith_ms {
                    builder = builder.faith_millis(faith);
                }
                if let Some(patience) = spec.patience_ms {
                    builder = builder.patience_millis(patience);
                }
                Ok(builder.build()?)
            })
            .collect()
    }

    pub fn worker(&self, base: &Path, observer: Arc<dyn Observer>) -> Result<SerialWorker> {
        let mut worker = SerialWorker::with_observer(observer);
        for job in self.jobs(base)? {
            worker.add_job(&job);
        }
        Ok(worker)
    }
}


/// Runs `sh -c <run>` as the task and `sh -c <check>` as the target.
#[derive(Debug, Clone)]
pub struct ShellTask {
    title: Option<String>,
    run: String,
    check: String,
    workdir: Option<PathBuf>,
}

impl ShellTask {
    pub fn new(run: impl Into<String>, check: impl Into<String>) -> Self {
        Self {
            title: None,
            run: run.into(),
            check: check.into(),
            workdir: None,
        }
    }

    pub fn from_spec(spec: &JobSpec, base: &Path) -> Self {
        Self {
            title: spec.title.clone(),
            run: spec.run.clone(),
            check: spec.check.clone(),
            workdir: Some(match &spec.workdir {
                Some(dir) => base.join(dir),
                None => base.to_path_buf(),
            }),
        }
    }

    fn shell(&self, script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script).stdin(Stdio::null()).kill_on_drop(true);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }
        command
    }
}

#[async_trait]
impl Task for ShellTask {
    async fn perform(&self) -> Result<()> {
        debug!(command = %self.run, "running shell task");
        let output = self
            .shell(&self.run)
            .output()
            .await
            .with_context(|| format!("Failed to spawn `{}`", self.run))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("`{}` exited with {}: {}", self.run, output.status, stderr.trim());
        }
        Ok(())
    }

    async fn is_done(&self) -> Result<bool> {
        let status = self
            .shell(&self.check)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .with_context(|| format!("Failed to spawn `{}`", self.check))?;
        Ok(status.success())
    }

    fn title(&self) -> Option<String> {
        self.title.clone().or_else(|| Some(self.run.clone()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_plan() {
        let plan = JobPlan::from_json(r#"{ "jobs": [ { "run": "true", "check": "true" } ] }"#).unwrap();
        assert_eq!(plan.attempts, None);
        assert_eq!(plan.jobs.len(), 1);
        assert_eq!(plan.jobs[0].title, None);
    }

    #[test]
    fn rejects_bad_plans() {
        let err = JobPlan::from_json(r#"{ "attempts": 0, "jobs": [] }"#).unwrap_err();
        assert!(format!("{err:#}").contains("at least 1"));

        let err = JobPlan::from_json(r#"{ "jobs": [ { "run": " ", "check": "true" } ] }"#).unwrap_err();
        assert!(format!("{err:#}").contains("empty run command"));

        let err = JobPlan::from_json(r#"{ "jobs": [ { "run": "true", "check": "true", "retries": 3 } ] }"#)
            .unwrap_err();
        assert!(format!("{err:#}").contains("Invalid job plan"));
    }

    #[test]
    fn jobs_carry_titles_and_timings() {
        let plan = JobPlan::from_json(
            r#"{ "jobs": [
                { "title": "first", "run": "true", "check": "true", "faith_ms": 900, "patience_ms": 30 },
                { "run": "echo hi", "check": "true" }
            ] }"#,
        )
        .unwrap();

        let jobs = plan.jobs(Path::new(".")).unwrap();
        assert_eq!(jobs[0].label(), "first");
        assert_eq!(jobs[0].faith().as_millis(), 900);
        assert_eq!(jobs[0].patience().as_millis(), 30);
        // untitled shell jobs are labelled with their command
        assert_eq!(jobs[1].label(), "echo hi");
        assert_eq!(jobs[1].faith().as_millis(), 3000);
    }

    #[tokio::test]
    async fn shell_task_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let task = ShellTask::from_spec(
            &JobSpec {
                title: None,
                run: "touch marker".into(),
                check: "test -f marker".into(),
                faith_ms: None,
                patience_ms: None,
                workdir: None,
            },
            dir.path(),
        );

        assert!(!task.is_done().await.unwrap());
        task.perform().await.unwrap();
        assert!(task.is_done().await.unwrap());

        let failing = ShellTask::new("echo nope >&2; exit 3", "true");
        let err = failing.perform().await.unwrap_err();
        assert!(err.to_string().contains("nope"), "{err}");
    }
}
