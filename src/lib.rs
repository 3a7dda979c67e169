//! dealwire - resolves deal-aggregator listings to verified merchant links
//! and publishes them into a managed section of an HTML page.
//!
//! Data flow: listing scrape -> [`pipeline::DealResolver`] (fetch, extract,
//! classify, verify) -> [`pipeline::DealSelector`] -> [`publish::SectionPublisher`].

pub mod config;
pub mod links;
pub mod models;
pub mod pipeline;
pub mod publish;
pub mod scrapers;
pub mod storage;
pub mod translate;
pub mod utils;
