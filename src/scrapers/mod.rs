//! Network access and listing scrape for the aggregator.

pub mod fetcher;
mod http_client;
pub mod listing;

pub use fetcher::{FetchError, PageFetcher, ProbeMethod};
pub use http_client::{default_headers, resolve_user_agent, HttpClient, USER_AGENT};
pub use listing::parse_listing;
