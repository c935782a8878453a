//! HTTP client for cars24 listing pages.

use std::time::Duration;

use url::Url;

use crate::{target::ListingTarget, user_agent::get_user_agent, Error};

/// Production site root.
pub const DEFAULT_BASE_URL: &str = "https://www.cars24.com";
/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
/// Attempts per page, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
/// Static pause between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

/// HTTP client for cars24 listing pages.
///
/// Sends requests with a browser-like header set and a randomized user agent.
/// Each attempt builds a fresh `reqwest::Client` so the user agent rotates
/// between retries. Failures are returned to the caller, which decides what
/// to try next; nothing here is fatal to a run.
pub struct Client {
    /// Base URL for the site. Defaults to `https://www.cars24.com`.
    base_url: String,
    timeout: Duration,
    max_attempts: u32,
    backoff: Duration,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a new client pointing at the production site.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Creates a new client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::new()
        }
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the attempt count (at least one) and the pause between attempts.
    pub fn with_retry(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.backoff = backoff;
        self
    }

    /// Fetches the markup of a listing page.
    pub async fn fetch_page(&self, target: &ListingTarget) -> Result<String, Error> {
        let url = target.url(&self.base_url)?;
        self.fetch_url(&url).await
    }

    /// Fetches `url`, retrying retryable failures with a static backoff.
    pub async fn fetch_url(&self, url: &Url) -> Result<String, Error> {
        let mut last_err = None;

        for attempt in 1..=self.max_attempts {
            tracing::debug!("Fetching {} (attempt {}/{})", url, attempt, self.max_attempts);
            match self.try_fetch(url).await {
                Ok(body) => {
                    tracing::info!("Fetched {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        self.max_attempts,
                        url,
                        e
                    );
                    let retryable = is_retryable(&e);
                    last_err = Some(e);
                    if !retryable {
                        break;
                    }
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }

        let err = last_err.unwrap_or_else(|| Error::RequestFailed("no attempt was made".into()));
        tracing::error!("Giving up on {}: {}", url, err);
        Err(err)
    }

    async fn try_fetch(&self, url: &Url) -> Result<String, Error> {
        let client = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed(e.to_string())
            })?;
        let resp = client
            .get(url.clone())
            .header(
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header("accept-language", "en-US,en;q=0.9")
            .header("upgrade-insecure-requests", "1")
            .header("sec-fetch-dest", "document")
            .header("sec-fetch-mode", "navigate")
            .header("sec-fetch-site", "none")
            .header("cache-control", "max-age=0")
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(body)
    }

    fn classify(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            Error::RequestFailed(e.to_string())
        }
    }
}

/// Client errors other than 408/429 will not change on a second attempt.
fn is_retryable(err: &Error) -> bool {
    match err {
        Error::HttpStatus { status, .. } => {
            !(400..500).contains(status) || *status == 408 || *status == 429
        }
        Error::InvalidUrl(_) => false,
        Error::RequestFailed(_) | Error::Timeout { .. } => true,
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    match body.char_indices().nth(MAX) {
        None => body.to_string(),
        Some((idx, _)) => format!("{}...[truncated]", &body[..idx]),
    }
}
