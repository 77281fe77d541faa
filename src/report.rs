use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::{CiTimesError, Result};
use crate::providers::github::{GitHubJob, GitHubWorkflowRun};

/// Timestamp layout used by the GitHub API and written back to the CSV.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One successful platform job and how long it ran.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub run_id: u64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub run_date: DateTime<Utc>,
    pub job_name: String,
    pub duration_seconds: f64,
    pub duration_minutes: f64,
}

impl ResultRow {
    fn new(run: &GitHubWorkflowRun, job_name: String, duration_seconds: f64) -> Self {
        Self {
            run_id: run.id,
            run_date: run.created_at,
            job_name,
            duration_seconds,
            duration_minutes: duration_seconds / 60.0,
        }
    }
}

/// Everything collected in one invocation.
#[derive(Debug)]
pub struct JobTimesReport {
    pub repository: String,
    pub workflow: String,
    pub platform: String,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub runs_analyzed: usize,
    pub rows: Vec<ResultRow>,
}

/// Duration statistics for one job name, in minutes.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStats {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

/// Groups rows by job name and summarises their durations, sorted by name.
pub fn job_stats(rows: &[ResultRow]) -> Vec<JobStats> {
    let mut by_name: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for row in rows {
        by_name
            .entry(row.job_name.as_str())
            .or_default()
            .push(row.duration_minutes);
    }

    by_name
        .into_iter()
        .map(|(name, mut minutes)| {
            minutes.sort_by(f64::total_cmp);
            let len = minutes.len();

            #[allow(clippy::cast_precision_loss)]
            let mean = minutes.iter().sum::<f64>() / len as f64;

            JobStats {
                name: name.to_string(),
                count: len,
                mean,
                p50: minutes[(len / 2).min(len - 1)],
                p95: minutes[(len * 95 / 100).min(len - 1)],
                min: minutes[0],
                max: minutes[len - 1],
            }
        })
        .collect()
}

fn serialize_timestamp<S>(value: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
}

/// Case-insensitive substring match of a job name against the platform token.
pub fn matches_platform(job_name: &str, platform: &str) -> bool {
    job_name.to_lowercase().contains(&platform.to_lowercase())
}

/// Builds the result rows for one run.
///
/// A job is kept only if its name contains `platform` (ignoring case) and it
/// concluded successfully: a failed job may stop at any point, so its elapsed
/// time says nothing about a full execution.
///
/// # Errors
///
/// Returns [`CiTimesError::MissingTimestamp`] if a kept job lacks its start or
/// completion time.
pub fn extract_rows(
    run: &GitHubWorkflowRun,
    jobs: Vec<GitHubJob>,
    platform: &str,
) -> Result<Vec<ResultRow>> {
    jobs.into_iter()
        .filter(|job| job.succeeded() && matches_platform(&job.name, platform))
        .map(|job| {
            let (Some(started_at), Some(completed_at)) = (job.started_at, job.completed_at) else {
                return Err(CiTimesError::MissingTimestamp { job: job.name });
            };

            #[allow(clippy::cast_precision_loss)]
            let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;

            Ok(ResultRow::new(run, job.name, duration_seconds))
        })
        .collect()
}
