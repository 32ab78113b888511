use std::ops::Index;

use tracing::debug;

use crate::job::Job;
use crate::utils::jconfig::{to_job_info, JobInfo};

/// Jobs in execution order. Each slot holds the queue's own copy.
#[derive(Debug, Default, Clone)]
pub struct JobQueue {
    jobs: Vec<Job>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a copy of `job` and returns its index.
    pub fn push(&mut self, job: &Job) -> usize {
        self.jobs.push(job.clone());
        let index = self.jobs.len() - 1;
        debug!(index, title = %job.label(), "Job added to queue");
        index
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Index of the final job, `None` for an empty queue.
    pub fn last_index(&self) -> Option<usize> {
        self.jobs.len().checked_sub(1)
    }

    pub fn get(&self, index: usize) -> Option<&Job> {
        self.jobs.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Job> {
        self.jobs.iter()
    }

    pub fn infos(&self) -> Vec<JobInfo> {
        self.jobs
            .iter()
            .enumerate()
            .map(|(index, job)| to_job_info(job, index))
            .collect()
    }
}

impl Index<usize> for JobQueue {
    type Output = Job;

    fn index(&self, index: usize) -> &Job {
        &self.jobs[index]
    }
}

impl<'a> IntoIterator for &'a JobQueue {
    type Item = &'a Job;
    type IntoIter = std::slice::Iter<'a, Job>;

    fn into_iter(self) -> Self::IntoIter {
        self.jobs.iter()
    }
}
