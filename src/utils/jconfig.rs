// src/utils/jconfig.rs

use serde::Serialize;

use crate::job::Job;



#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    pub index: usize,
    pub title: Option<String>,
    pub faith_ms: u64,
    pub patience_ms: u64,
}



pub fn to_job_info(job: &Job, index: usize) -> JobInfo {
    JobInfo {
        index,
        title: job.title().map(String::from),
        faith_ms: u64::try_from(job.faith().as_millis()).unwrap_or(u64::MAX),
        patience_ms: u64::try_from(job.patience().as_millis()).unwrap_or(u64::MAX),
    }
}
