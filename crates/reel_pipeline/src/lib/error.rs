use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed script response: {0}")]
    Upstream(String),
    #[error("transport error: {status} - {message}")]
    Transport { status: u16, message: String },
    #[error("remote job did not reach a terminal state within {deadline:?}")]
    JobTimeout { deadline: Duration },
    #[error("remote service reports exhausted credits")]
    AuthorizationExhausted,
    #[error("run cancelled")]
    Cancelled,
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
