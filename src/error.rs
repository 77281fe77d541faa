use thiserror::Error;

#[derive(Error, Debug)]
pub enum CiTimesError {
    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("GitHub API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Job '{job}' succeeded but has no start or completion time")]
    MissingTimestamp { job: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CiTimesError>;
