//! Error types for the listing page fetcher.

/// Errors that can occur when fetching a listing page.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request could not be sent or the body could not be read.
    #[error("Request failed: {0}")]
    RequestFailed(String),
    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },
    /// The site returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// A target URL could not be built from the base URL and path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Short, log-friendly reason used when recording a failed target.
    pub fn reason(&self) -> String {
        match self {
            Self::HttpStatus { status, .. } => format!("HTTP {}", status),
            other => other.to_string(),
        }
    }
}
