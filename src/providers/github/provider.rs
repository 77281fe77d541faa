use chrono::{DateTime, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use log::{debug, info, warn};

use crate::auth::Token;
use crate::config::FetchPolicy;
use crate::error::{CiTimesError, Result};
use crate::output::PhaseProgress;
use crate::report::{extract_rows, JobTimesReport};

use super::client::GitHubClient;
use super::types::{GitHubJob, GitHubWorkflowRun};

/// What to collect and how to schedule the job requests.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Workflow file name (e.g., "tests.yml")
    pub workflow: String,
    /// Token a job name must contain, compared case-insensitively
    pub platform: String,
    /// Oldest run creation time to include
    pub cutoff: DateTime<Utc>,
    /// Hard ceiling on run-listing pages
    pub max_pages: Option<usize>,
    pub policy: FetchPolicy,
    /// Upper bound on runs whose jobs are fetched at once (concurrent policy)
    pub max_concurrency: usize,
}

/// Provider for collecting job durations from GitHub Actions.
pub struct GitHubProvider {
    /// GitHub API client
    client: GitHubClient,
    /// Repository owner
    owner: String,
    /// Repository name
    repo: String,
}

impl GitHubProvider {
    /// Create a new GitHub Actions provider.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitHub API base URL
    /// * `repo_path` - Repository path in format "owner/repo"
    /// * `token` - Optional GitHub token
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not `owner/repo` or the client cannot be built.
    pub fn new(base_url: &str, repo_path: &str, token: Option<Token>) -> Result<Self> {
        let (owner, repo) = match repo_path.split('/').collect::<Vec<_>>()[..] {
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
                (owner.to_string(), repo.to_string())
            }
            _ => {
                return Err(CiTimesError::Config(format!(
                    "Repository path must be in format 'owner/repo', got '{repo_path}'"
                )))
            }
        };

        let client = GitHubClient::new(base_url, owner.clone(), repo.clone(), token)?;

        Ok(Self {
            client,
            owner,
            repo,
        })
    }

    /// Collect the durations of successful platform jobs.
    ///
    /// Progress is displayed in three phases:
    /// 1. Listing successful runs back to the cutoff
    /// 2. Fetching the jobs of each run
    /// 3. Filtering jobs and computing durations
    ///
    /// Under [`FetchPolicy::Concurrent`] the row order depends on which runs
    /// finish first and must be treated as unordered.
    ///
    /// # Errors
    ///
    /// Returns an error if any API request fails, a response cannot be
    /// decoded, or a kept job lacks timestamps.
    pub async fn collect_job_times(&self, options: &CollectOptions) -> Result<JobTimesReport> {
        info!(
            "Collecting '{}' job durations for {}/{} workflow {}",
            options.platform, self.owner, self.repo, options.workflow
        );

        let progress = PhaseProgress::start_phase_1();

        let runs = self
            .client
            .fetch_successful_runs(&options.workflow, options.cutoff, options.max_pages)
            .await?;

        info!(
            "Found {} successful runs since {}",
            runs.len(),
            options.cutoff.format("%Y-%m-%d")
        );
        if runs.is_empty() {
            warn!(
                "No successful runs found for {}/{} workflow {}",
                self.owner, self.repo, options.workflow
            );
        }

        let progress = progress.finish_phase_1_start_phase_2(runs.len());

        let run_jobs = match options.policy {
            FetchPolicy::Sequential => self.fetch_sequential(&runs, &progress).await?,
            FetchPolicy::Concurrent => {
                self.fetch_concurrent(&runs, options.max_concurrency, &progress)
                    .await?
            }
        };

        let progress = progress.finish_phase_2_start_phase_3();

        let mut rows = Vec::new();
        for (run, jobs) in run_jobs {
            rows.extend(extract_rows(run, jobs, &options.platform)?);
        }
        debug!("Kept {} '{}' jobs", rows.len(), options.platform);

        let report = JobTimesReport {
            repository: format!("{}/{}", self.owner, self.repo),
            workflow: options.workflow.clone(),
            platform: options.platform.clone(),
            since: options.cutoff,
            until: Utc::now(),
            runs_analyzed: runs.len(),
            rows,
        };

        progress.finish_phase_3(report.rows.len());

        Ok(report)
    }

    async fn fetch_sequential<'a>(
        &self,
        runs: &'a [GitHubWorkflowRun],
        progress: &PhaseProgress,
    ) -> Result<Vec<(&'a GitHubWorkflowRun, Vec<GitHubJob>)>> {
        let mut run_jobs = Vec::with_capacity(runs.len());

        for run in runs {
            let jobs = self.client.fetch_run_jobs(&run.jobs_url).await?;
            run_jobs.push((run, jobs));
            progress.inc();
        }

        Ok(run_jobs)
    }

    /// One job-listing sequence per run, at most `max_concurrency` in flight.
    /// Results are gathered after every sequence finishes, in completion order.
    async fn fetch_concurrent<'a>(
        &self,
        runs: &'a [GitHubWorkflowRun],
        max_concurrency: usize,
        progress: &PhaseProgress,
    ) -> Result<Vec<(&'a GitHubWorkflowRun, Vec<GitHubJob>)>> {
        stream::iter(runs)
            .map(|run| async move {
                let jobs = self.client.fetch_run_jobs(&run.jobs_url).await?;
                progress.inc();
                Ok::<_, CiTimesError>((run, jobs))
            })
            .buffer_unordered(max_concurrency.max(1))
            .try_collect()
            .await
    }
}
