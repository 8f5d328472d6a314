//! Error types for podviz.
//!
//! The aggregation core never fails; these errors come from the layers around
//! it (fetching, caching, scheduling, analytics and configuration).

use thiserror::Error;

/// Custom error type for podviz operations.
///
/// `#[from]` variants let the `?` operator convert library errors directly.
#[derive(Debug, Error)]
pub enum PodVizError {
    /// Error reading or writing the leaf cache file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing JSON data.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Error making HTTP requests to the pnode API.
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Error creating or running the refresh scheduler.
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),

    /// Error building or querying the analytics frame.
    #[error("Analytics error: {0}")]
    Analytics(#[from] polars::prelude::PolarsError),

    /// Error when the API returns an unexpected status or shape.
    #[error("Invalid API response: {0}")]
    InvalidApiResponse(String),

    /// Error when a node query names a command outside the allowlist.
    #[error("Unsupported node query: {0}")]
    UnsupportedQuery(String),

    /// Error when an environment variable holds an unusable value.
    #[error("Invalid configuration for {name}: {reason}")]
    InvalidConfig { name: &'static str, reason: String },
}
