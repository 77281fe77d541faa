use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use crate::auth;
use crate::config::{Config, FetchPolicy};
use crate::output;
use crate::providers::github::CollectOptions;
use crate::providers::GitHubProvider;

/// Command-line arguments. Each one overrides the config file value.
#[derive(Parser, Debug)]
#[command(name = "ci-times")]
#[command(author, version, about = "Collect per-platform CI job durations from GitHub Actions", long_about = None)]
pub struct Cli {
    /// GitHub token; falls back to `gh auth token`
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Repository as owner/repo
    #[arg(short, long)]
    repo: Option<String>,

    /// Workflow file name
    #[arg(short, long)]
    workflow: Option<String>,

    /// Job name token to match, case-insensitive
    #[arg(short, long)]
    platform: Option<String>,

    /// Length of the trailing window in days
    #[arg(short, long)]
    days: Option<u32>,

    /// CSV output path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// How job lists are fetched
    #[arg(short, long, value_enum)]
    mode: Option<FetchPolicy>,

    /// Maximum runs fetched at once in concurrent mode
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Stop listing runs after this many pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Config file (defaults to ./ci-times.{toml,json,yaml,yml} if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not print the per-job summary table
    #[arg(long, default_value_t = false)]
    no_summary: bool,
}

impl Cli {
    /// Config file values with the command-line overrides applied.
    fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        let github = &mut config.github;

        if let Some(token) = &self.token {
            github.token = Some(token.clone());
        }
        if let Some(base_url) = &self.base_url {
            github.base_url.clone_from(base_url);
        }
        if let Some(repo) = &self.repo {
            github.repo.clone_from(repo);
        }
        if let Some(workflow) = &self.workflow {
            github.workflow.clone_from(workflow);
        }
        if let Some(platform) = &self.platform {
            github.platform.clone_from(platform);
        }
        if let Some(days) = self.days {
            github.window_days = days;
        }
        if let Some(mode) = self.mode {
            github.mode = mode;
        }
        if let Some(max_concurrency) = self.max_concurrency {
            github.max_concurrency = max_concurrency;
        }
        if self.max_pages.is_some() {
            github.max_pages = self.max_pages;
        }
        if let Some(output) = &self.output {
            config.output.path.clone_from(output);
        }
        if self.no_summary {
            config.output.summary = false;
        }

        config.validate()?;
        Ok(config)
    }

    pub async fn execute(&self) -> Result<()> {
        let config = self.resolve_config()?;
        let github = &config.github;

        info!(
            "Collecting '{}' job durations for {} ({})",
            github.platform, github.repo, github.workflow
        );

        let token = auth::resolve_token(github.token.as_deref())?;
        let provider = GitHubProvider::new(&github.base_url, &github.repo, Some(token))?;

        let options = CollectOptions {
            workflow: github.workflow.clone(),
            platform: github.platform.clone(),
            cutoff: Utc::now() - Duration::days(i64::from(github.window_days)),
            max_pages: github.max_pages,
            policy: github.mode,
            max_concurrency: github.max_concurrency,
        };

        let report = provider
            .collect_job_times(&options)
            .await
            .context("Failed to collect job durations")?;

        output::write_csv(&config.output.path, &report.rows).with_context(|| {
            format!("Failed to write CSV: {}", config.output.path.display())
        })?;

        if config.output.summary {
            output::print_summary(&report);
        }
        eprintln!(
            "{}",
            output::dim(format!("Results written to {}", config.output.path.display()))
        );

        Ok(())
    }
}
