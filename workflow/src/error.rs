use models::ScanStatus;
use thiserror::Error;

/// Errors surfaced by the scan workflow.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("invalid URL: {0:?} (expected an absolute http:// or https:// URL)")]
    InvalidUrl(String),

    #[error("authentication required: sign in and try again")]
    AuthRequired,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("scan failed: {0}")]
    ScanFailed(String),

    #[error("a report needs a completed scan, this one is {0}")]
    NotCompleted(ScanStatus),

    #[error("no API URL configured (use --api-url, SITEWARD_API_URL or `siteward auth set-url`)")]
    NoApiUrl,

    #[error("config directory could not be determined (HOME is not set)")]
    NoConfigDir,

    #[error("status poller stopped unexpectedly: {0}")]
    PollerTask(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the remote scan backend.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("the backend rejected the credentials (401)")]
    Unauthorized,

    #[error("backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("unreadable backend response: {0}")]
    Decode(String),

    #[error("cannot build endpoint URL: {0}")]
    InvalidEndpoint(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Network("request timed out".into())
        } else if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Network(e.to_string())
        }
    }
}

impl From<BackendError> for WorkflowError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Unauthorized => WorkflowError::AuthRequired,
            other => WorkflowError::Transport(other.to_string()),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WorkflowError>;
