use reqwest::StatusCode;
use thiserror::Error;

/// Failure of the initial full-collection read. Terminal for the first
/// render: the loader converts any of these into the static failure notice
/// and does not retry.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("listing request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed listing entry for '{activity}': {source}")]
    MalformedEntry {
        activity: String,
        source: serde_json::Error,
    },
}

/// Failure of a signup or unregister request. Classified at the operation
/// boundary into a transient status message (signup) or a blocking
/// notification (unregister); never propagated to callers.
#[derive(Debug, Error)]
pub enum MutationError {
    /// Non-success status with whatever rejection text the body carried.
    #[error("server rejected the request: status {status}")]
    Rejected {
        status: StatusCode,
        detail: Option<String>,
    },
    /// The request never produced a usable response.
    #[error("request failed in transport: {0}")]
    Transport(#[from] reqwest::Error),
}
