//! HTTP client with a fixed browser-like header set.

mod user_agent;

pub use user_agent::{default_headers, resolve_user_agent, USER_AGENT};

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::fetcher::{FetchError, PageFetcher, ProbeMethod};

/// Reqwest-backed page fetcher.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent.
    pub fn new(timeout: Duration, referer: Option<&str>) -> Result<Self, FetchError> {
        Self::with_user_agent(timeout, referer, None)
    }

    /// Create a new HTTP client with custom user agent configuration.
    /// - None: Use the default browser user agent
    /// - Some("impersonate"): Use random real browser user agent
    /// - Some(custom): Use custom user agent string
    pub fn with_user_agent(
        timeout: Duration,
        referer: Option<&str>,
        user_agent_config: Option<&str>,
    ) -> Result<Self, FetchError> {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .default_headers(default_headers(referer))
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        debug!(
            "GET {} -> {} in {}ms",
            url,
            status.as_u16(),
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::network(url, e))
    }

    async fn probe(&self, url: &str, method: ProbeMethod) -> Result<u16, FetchError> {
        let request = match method {
            ProbeMethod::Head => self.client.head(url),
            ProbeMethod::Get => self.client.get(url),
        };

        let start = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;
        let status = response.status().as_u16();

        debug!(
            "{} {} -> {} in {}ms",
            method.as_str(),
            url,
            status,
            start.elapsed().as_millis()
        );

        Ok(status)
    }
}
