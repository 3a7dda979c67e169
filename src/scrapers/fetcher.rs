//! Network seam used by the resolver and verifier.

use async_trait::async_trait;
use thiserror::Error;

/// Failure at the page-fetch boundary. Never propagated past a candidate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    pub fn network(url: &str, message: impl ToString) -> Self {
        Self::Network {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}

/// HTTP method used for a liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeMethod {
    Head,
    Get,
}

impl ProbeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "HEAD",
            Self::Get => "GET",
        }
    }
}

/// Fetches pages and probes URLs.
///
/// Implementations must not retry internally; callers own retry policy.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET a page and return its body. Non-2xx statuses are failures.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;

    /// Issue a request and return the final status code after redirects.
    async fn probe(&self, url: &str, method: ProbeMethod) -> Result<u16, FetchError>;
}
