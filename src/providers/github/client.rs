use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{CiTimesError, Result};

use super::types::{GitHubJob, GitHubWorkflowRun, WorkflowJobsResponse, WorkflowRunsResponse};

pub(super) const PAGE_SIZE: usize = 100;

/// GitHub REST API client for one repository.
pub struct GitHubClient {
    client: Client,
    api_url: Url,
    owner: String,
    repo: String,
}

impl GitHubClient {
    /// Create a new GitHub API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitHub API base URL (e.g., <https://api.github.com>)
    /// * `owner` - Repository owner/organization
    /// * `repo` - Repository name
    /// * `token` - Optional GitHub token sent with every request
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid, the token cannot be used
    /// as a header value, or the HTTP client cannot be built.
    pub fn new(base_url: &str, owner: String, repo: String, token: Option<Token>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("token {}", token.as_str()))
                .map_err(|_| CiTimesError::Credential("token contains invalid characters".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("ci-times/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| CiTimesError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Url::join drops the last path segment unless it ends with '/'
        let api_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };

        Ok(Self {
            client,
            api_url,
            owner,
            repo,
        })
    }

    fn workflow_runs_url(&self, workflow: &str) -> Result<Url> {
        Ok(self.api_url.join(&format!(
            "repos/{}/{}/actions/workflows/{}/runs",
            self.owner, self.repo, workflow
        ))?)
    }

    /// GET `url` with `query` and decode the JSON body. Any non-2xx status is an error.
    async fn get_json<T>(&self, url: Url, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        debug!("GET {url} {query:?}");

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(CiTimesError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetch one page of completed runs of `workflow`, newest first.
    pub async fn fetch_runs_page(
        &self,
        workflow: &str,
        page: usize,
    ) -> Result<Vec<GitHubWorkflowRun>> {
        let response: WorkflowRunsResponse = self
            .get_json(
                self.workflow_runs_url(workflow)?,
                &[
                    ("status", "completed".to_string()),
                    ("per_page", PAGE_SIZE.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;

        Ok(response.workflow_runs)
    }

    /// Fetch the successful runs of `workflow` created at or after `cutoff`.
    ///
    /// Pages are requested until one is empty or until the page holding the
    /// first run older than `cutoff` has been consumed. `max_pages` puts a
    /// hard ceiling on the number of pages requested.
    ///
    /// The early exit relies on the API listing runs newest first; a run newer
    /// than its predecessor is logged as a warning.
    ///
    /// # Errors
    ///
    /// Returns an error on the first failed request; nothing is returned partially.
    pub async fn fetch_successful_runs(
        &self,
        workflow: &str,
        cutoff: DateTime<Utc>,
        max_pages: Option<usize>,
    ) -> Result<Vec<GitHubWorkflowRun>> {
        let mut runs = Vec::new();
        let mut previous = None;
        let mut page = 1;

        loop {
            let page_runs = self.fetch_runs_page(workflow, page).await?;
            if page_runs.is_empty() {
                break;
            }

            let (kept, reached_cutoff) = retain_successful(page_runs, cutoff, &mut previous);
            runs.extend(kept);

            info!("Fetched page {page} ({} successful runs so far)", runs.len());

            if reached_cutoff {
                break;
            }

            if max_pages.is_some_and(|max| page >= max) {
                warn!("Stopped after {page} pages (page ceiling reached)");
                break;
            }

            page += 1;
        }

        Ok(runs)
    }

    /// Fetch every job of one run by following its `jobs_url`.
    ///
    /// Stops on an empty page or a page shorter than the page size.
    pub async fn fetch_run_jobs(&self, jobs_url: &str) -> Result<Vec<GitHubJob>> {
        let url = Url::parse(jobs_url)?;
        let mut all_jobs = Vec::new();
        let mut page = 1;

        loop {
            let response: WorkflowJobsResponse = self
                .get_json(
                    url.clone(),
                    &[
                        ("per_page", PAGE_SIZE.to_string()),
                        ("page", page.to_string()),
                    ],
                )
                .await?;

            let fetched = response.jobs.len();
            all_jobs.extend(response.jobs);

            if fetched < PAGE_SIZE {
                break;
            }

            page += 1;
        }

        Ok(all_jobs)
    }
}

/// Keeps the successful runs of one page that are not older than `cutoff`.
///
/// Returns the kept runs and whether a run older than `cutoff` was seen.
/// Runs after the first old run on the page are not inspected.
fn retain_successful(
    page_runs: Vec<GitHubWorkflowRun>,
    cutoff: DateTime<Utc>,
    previous: &mut Option<DateTime<Utc>>,
) -> (Vec<GitHubWorkflowRun>, bool) {
    let mut kept = Vec::new();

    for run in page_runs {
        if previous.is_some_and(|prev| run.created_at > prev) {
            warn!(
                "Run {} is newer than the run listed before it; runs are not newest-first",
                run.id
            );
        }
        *previous = Some(run.created_at);

        if run.created_at < cutoff {
            return (kept, true);
        }

        if run.succeeded() {
            kept.push(run);
        }
    }

    (kept, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::github::types::Conclusion;
    use chrono::TimeZone;

    fn run(id: u64, day: u32, conclusion: Conclusion) -> GitHubWorkflowRun {
        GitHubWorkflowRun {
            id,
            created_at: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
            conclusion: Some(conclusion),
            jobs_url: format!("https://api.github.com/repos/o/r/actions/runs/{id}/jobs"),
        }
    }

    #[test]
    fn test_retain_drops_unsuccessful_runs() {
        let cutoff = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let page = vec![
            run(3, 20, Conclusion::Success),
            run(2, 19, Conclusion::Failure),
            run(1, 18, Conclusion::Cancelled),
        ];

        let (kept, reached) = retain_successful(page, cutoff, &mut None);

        assert!(!reached);
        assert_eq!(kept.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_retain_stops_at_first_old_run() {
        let cutoff = Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap();
        let page = vec![
            run(4, 12, Conclusion::Success),
            run(3, 9, Conclusion::Success),
            // Never inspected: the page already crossed the cutoff.
            run(2, 11, Conclusion::Success),
        ];

        let (kept, reached) = retain_successful(page, cutoff, &mut None);

        assert!(reached);
        assert_eq!(kept.iter().map(|r| r.id).collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_retain_keeps_out_of_order_runs_inside_window() {
        let cutoff = Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap();
        let mut previous = None;

        // Run 5 is newer than run 4 before it; both are inside the window.
        let (kept, reached) = retain_successful(
            vec![run(4, 14, Conclusion::Success), run(5, 16, Conclusion::Success)],
            cutoff,
            &mut previous,
        );
        assert!(!reached);
        assert_eq!(kept.iter().map(|r| r.id).collect::<Vec<_>>(), vec![4, 5]);
        assert_eq!(previous, Some(Utc.with_ymd_and_hms(2024, 5, 16, 12, 0, 0).unwrap()));

        // The ordering check carries across pages and does not change the cutoff stop.
        let (kept, reached) = retain_successful(
            vec![run(6, 20, Conclusion::Success), run(3, 9, Conclusion::Success)],
            cutoff,
            &mut previous,
        );
        assert!(reached);
        assert_eq!(kept.iter().map(|r| r.id).collect::<Vec<_>>(), vec![6]);
        assert_eq!(previous, Some(Utc.with_ymd_and_hms(2024, 5, 9, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_retain_keeps_run_exactly_at_cutoff() {
        let cutoff = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let (kept, reached) =
            retain_successful(vec![run(1, 10, Conclusion::Success)], cutoff, &mut None);

        assert!(!reached);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_client_rejects_invalid_base_url() {
        let result = GitHubClient::new("not a url", "o".into(), "r".into(), None);
        assert!(matches!(result, Err(CiTimesError::InvalidUrl(_))));
    }

    #[test]
    fn test_runs_url_keeps_base_path() {
        let client = GitHubClient::new(
            "https://ghe.example.com/api/v3",
            "conda".into(),
            "conda".into(),
            None,
        )
        .unwrap();

        assert_eq!(
            client.workflow_runs_url("tests.yml").unwrap().as_str(),
            "https://ghe.example.com/api/v3/repos/conda/conda/actions/workflows/tests.yml/runs"
        );
    }
}
