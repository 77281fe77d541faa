use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal status of a workflow run or job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    Neutral,
    Stale,
    StartupFailure,
    #[serde(other)]
    Other,
}

/// GitHub Actions workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubWorkflowRun {
    /// Unique identifier for the workflow run
    pub id: u64,
    /// When the run was created
    pub created_at: DateTime<Utc>,
    /// Conclusion of the run, absent until it completes
    pub conclusion: Option<Conclusion>,
    /// API URL listing this run's jobs
    pub jobs_url: String,
}

impl GitHubWorkflowRun {
    pub fn succeeded(&self) -> bool {
        self.conclusion == Some(Conclusion::Success)
    }
}

/// Job within a GitHub Actions workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubJob {
    /// Name of the job
    pub name: String,
    /// Conclusion of the job
    pub conclusion: Option<Conclusion>,
    /// When the job started
    pub started_at: Option<DateTime<Utc>>,
    /// When the job completed
    pub completed_at: Option<DateTime<Utc>>,
}

impl GitHubJob {
    pub fn succeeded(&self) -> bool {
        self.conclusion == Some(Conclusion::Success)
    }
}

/// Response from GitHub API for workflow runs.
#[derive(Deserialize)]
pub(super) struct WorkflowRunsResponse {
    pub workflow_runs: Vec<GitHubWorkflowRun>,
}

/// Response from GitHub API for workflow jobs.
#[derive(Deserialize)]
pub(super) struct WorkflowJobsResponse {
    pub jobs: Vec<GitHubJob>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_conclusion_parses_as_other() {
        let job: GitHubJob = serde_json::from_str(
            r#"{"id": 1, "name": "x", "status": "completed", "conclusion": "brand_new",
                "started_at": null, "completed_at": null}"#,
        )
        .unwrap();
        assert_eq!(job.conclusion, Some(Conclusion::Other));
        assert!(!job.succeeded());
    }

    #[test]
    fn test_run_ignores_extra_fields() {
        let run: GitHubWorkflowRun = serde_json::from_str(
            r#"{"id": 7, "name": "Tests", "created_at": "2024-03-01T10:00:00Z",
                "status": "completed", "conclusion": "timed_out",
                "jobs_url": "https://api.github.com/repos/o/r/actions/runs/7/jobs",
                "head_sha": "abc"}"#,
        )
        .unwrap();
        assert_eq!(run.id, 7);
        assert_eq!(run.conclusion, Some(Conclusion::TimedOut));
        assert_eq!(run.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_malformed_timestamp_is_rejected() {
        let result = serde_json::from_str::<GitHubWorkflowRun>(
            r#"{"id": 7, "created_at": "01/03/2024", "status": "completed",
                "conclusion": "success", "jobs_url": "x"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_minimal_payloads_parse() {
        let run: GitHubWorkflowRun = serde_json::from_str(
            r#"{"id": 7, "created_at": "2024-03-01T10:00:00Z", "conclusion": "success",
                "jobs_url": "x"}"#,
        )
        .unwrap();
        assert!(run.succeeded());

        let job: GitHubJob = serde_json::from_str(
            r#"{"name": "windows", "conclusion": "success",
                "started_at": "2024-03-01T10:01:00Z", "completed_at": "2024-03-01T10:03:05Z"}"#,
        )
        .unwrap();
        assert!(job.succeeded());
    }
}
