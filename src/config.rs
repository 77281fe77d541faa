use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file structure for ci-times.
///
/// Every value has a built-in default; a config file only needs the keys it
/// changes. Command-line arguments override both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Where and what to collect
    #[serde(default)]
    pub github: GitHubConfig,

    /// Where to write the results
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// GitHub token; the GitHub CLI session is used when absent
    pub token: Option<String>,

    /// GitHub API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Repository path (e.g., 'owner/repo')
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Workflow file name
    #[serde(default = "default_workflow")]
    pub workflow: String,

    /// Token a job name must contain (case-insensitive)
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Length of the trailing window in days
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Hard ceiling on run-listing pages
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// How job lists are fetched
    #[serde(default)]
    pub mode: FetchPolicy,

    /// Maximum runs fetched at once in concurrent mode
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// CSV file to write
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Print the per-job summary table
    #[serde(default = "default_true")]
    pub summary: bool,
}

/// Scheduling of the per-run job requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FetchPolicy {
    /// One run at a time, in listing order
    Sequential,
    /// All runs at once; row order follows completion order
    #[default]
    Concurrent,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            repo: default_repo(),
            workflow: default_workflow(),
            platform: default_platform(),
            window_days: default_window_days(),
            max_pages: None,
            mode: FetchPolicy::default(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            summary: true,
        }
    }
}

fn default_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_repo() -> String {
    "conda/conda".to_string()
}

fn default_workflow() -> String {
    "tests.yml".to_string()
}

fn default_platform() -> String {
    "windows".to_string()
}

fn default_window_days() -> u32 {
    90
}

fn default_max_concurrency() -> usize {
    500
}

fn default_output_path() -> PathBuf {
    Path::new("data").join("windows_ci_times.csv")
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./ci-times.toml
    /// 3. ./ci-times.json
    /// 4. ./ci-times.yaml
    /// 5. ./ci-times.yml
    ///
    /// Returns default configuration if no path is given and no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_in(Path::new("."), path)
    }

    fn load_in(dir: &Path, path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "ci-times.toml",
            "ci-times.json",
            "ci-times.yaml",
            "ci-times.yml",
        ];

        for candidate in &candidates {
            let path = dir.join(candidate);
            if path.exists() {
                log::debug!("Using config file {}", path.display());
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Reject values the collector cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.github.window_days == 0 {
            bail!("window-days must be at least 1");
        }
        if self.github.max_concurrency == 0 {
            bail!("max-concurrency must be at least 1");
        }
        if self.github.max_pages == Some(0) {
            bail!("max-pages must be at least 1 when set");
        }
        if self.github.platform.trim().is_empty() {
            bail!("platform must not be empty");
        }
        Ok(())
    }
}
