//! Liveness probe for a resolved merchant link.

use tracing::debug;

use crate::scrapers::fetcher::{PageFetcher, ProbeMethod};

/// Lowest status that counts as a dead link.
const FIRST_ERROR_STATUS: u16 = 400;

/// Confirms a URL answers with a non-error status.
///
/// A HEAD request is tried first. Servers that reject HEAD get one GET
/// retry. Redirects are followed by the fetcher, so only the final status
/// is judged.
pub struct LinkVerifier<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a F,
}

impl<'a, F: PageFetcher + ?Sized> LinkVerifier<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }

    pub async fn verify(&self, url: &str) -> bool {
        match self.fetcher.probe(url, ProbeMethod::Head).await {
            Ok(status) if status < FIRST_ERROR_STATUS => true,
            Ok(status) => {
                debug!("HEAD {} returned {}, retrying with GET", url, status);
                match self.fetcher.probe(url, ProbeMethod::Get).await {
                    Ok(status) => {
                        debug!("GET {} returned {}", url, status);
                        status < FIRST_ERROR_STATUS
                    }
                    Err(e) => {
                        debug!("GET {} failed: {}", url, e);
                        false
                    }
                }
            }
            Err(e) => {
                debug!("HEAD {} failed: {}", url, e);
                false
            }
        }
    }
}
