mod client;
mod provider;
mod types;


pub use provider::{CollectOptions, GitHubProvider};
pub use types::{GitHubJob, GitHubWorkflowRun};

#[cfg(test)]
pub use types::Conclusion;
