//! Per-candidate resolution: detail page to verified merchant link.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use super::error::{ResolveError, Stage};
use crate::links::extractor::LinkCandidate;
use crate::links::page::resolve;
use crate::links::{collapse_whitespace, LinkClassifier, LinkExtractor, LinkVerdict, LinkVerifier};
use crate::models::{CandidateDeal, LinkConfidence, ResolvedDeal};
use crate::scrapers::PageFetcher;
use crate::utils::truncate_chars;

/// Resolver tuning. Defaults match the aggregator's informal rate limits.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Aggregator root, used for relative URLs and the aggregator host.
    pub base_url: String,
    /// Pause between candidates.
    pub candidate_delay: Duration,
    /// Claim pages followed per candidate, including nested ones.
    pub max_claim_hops: usize,
    /// Description cap in characters.
    pub description_limit: usize,
    /// Candidates taken from the front of a batch.
    pub max_candidates: usize,
    /// Domains trusted in addition to the built-in allowlist.
    pub trusted_domains: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.latestfreestuff.co.uk".to_string(),
            candidate_delay: Duration::from_millis(2000),
            max_claim_hops: 1,
            description_limit: 300,
            max_candidates: 20,
            trusted_domains: Vec::new(),
        }
    }
}

/// A dropped candidate and why.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub detail_url: String,
    pub title: String,
    pub error: ResolveError,
}

impl Rejection {
    /// Last stage reached before rejection.
    pub fn stage(&self) -> Stage {
        self.error.stage()
    }
}

/// Outcome of resolving a batch.
#[derive(Debug, Clone, Default)]
pub struct ResolveReport {
    /// Published deals in input order.
    pub deals: Vec<ResolvedDeal>,
    pub rejected: Vec<Rejection>,
}

/// Drives candidates through extraction, classification and verification.
///
/// Candidates are handled strictly one at a time with a fixed pause
/// between them. A failure only ever drops the candidate at hand.
pub struct DealResolver<F: PageFetcher> {
    fetcher: F,
    extractor: LinkExtractor,
    base: Option<Url>,
    config: ResolverConfig,
}

impl<F: PageFetcher> DealResolver<F> {
    pub fn new(fetcher: F, config: ResolverConfig) -> Self {
        let classifier = LinkClassifier::for_base_url(&config.base_url)
            .with_trusted_domains(&config.trusted_domains);
        Self {
            fetcher,
            extractor: LinkExtractor::new(classifier),
            base: Url::parse(&config.base_url).ok(),
            config,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn classifier(&self) -> &LinkClassifier {
        self.extractor.classifier()
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a batch in order, pausing between candidates.
    pub async fn resolve_all(&self, candidates: &[CandidateDeal]) -> ResolveReport {
        let batch = &candidates[..candidates.len().min(self.config.max_candidates)];
        if batch.len() < candidates.len() {
            info!(
                "Processing first {} of {} candidates",
                batch.len(),
                candidates.len()
            );
        }

        let mut report = ResolveReport::default();
        for (i, candidate) in batch.iter().enumerate() {
            if i > 0 && !self.config.candidate_delay.is_zero() {
                tokio::time::sleep(self.config.candidate_delay).await;
            }
            info!(
                "Resolving {}/{}: {}",
                i + 1,
                batch.len(),
                candidate.title
            );

            match self.resolve_one(candidate).await {
                Ok(deal) => {
                    debug!("{} -> {} ({})", candidate.detail_url, deal.url, Stage::Published);
                    report.deals.push(deal);
                }
                Err(error) => {
                    warn!(
                        "Rejected {} at stage {}: {}",
                        candidate.detail_url,
                        error.stage(),
                        error
                    );
                    report.rejected.push(Rejection {
                        detail_url: candidate.detail_url.clone(),
                        title: candidate.title.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            "Resolved {} deals, rejected {}",
            report.deals.len(),
            report.rejected.len()
        );
        report
    }

    /// Run one candidate from `Raw` to `Published`.
    pub async fn resolve_one(&self, candidate: &CandidateDeal) -> Result<ResolvedDeal, ResolveError> {
        let detail_url = resolve(self.base.as_ref(), &candidate.detail_url)
            .filter(|_| !candidate.detail_url.trim().is_empty())
            .ok_or_else(|| ResolveError::InvalidCandidate(candidate.detail_url.clone()))?;

        let url = self.extract(&detail_url).await?;
        debug!("{} -> {} ({})", detail_url, url, Stage::Extracted);

        let confidence = match self.classifier().classify(&url) {
            LinkVerdict::Denied(reason) => {
                return Err(ResolveError::Classification { url, reason });
            }
            verdict => verdict.confidence(),
        };
        debug!("{} ({})", url, Stage::Classified);

        if !LinkVerifier::new(&self.fetcher).verify(&url).await {
            return Err(ResolveError::Verification { url });
        }
        debug!("{} ({})", url, Stage::Verified);

        Ok(self.normalize(candidate, detail_url, url, confidence))
    }

    /// `Raw -> Extracted`: find the merchant URL behind a detail page.
    async fn extract(&self, detail_url: &str) -> Result<String, ResolveError> {
        let classifier = self.classifier();
        if !classifier.is_aggregator_url(detail_url) {
            debug!("Detail link {} is already external", detail_url);
            return Ok(detail_url.to_string());
        }

        let body = self.fetcher.fetch(detail_url).await?;
        let mut visited = HashSet::from([detail_url.to_string()]);

        for found in self.extractor.candidates(&body, detail_url) {
            match found.candidate {
                LinkCandidate::Direct(url) => {
                    debug!("Strategy {} matched {}", found.strategy, url);
                    return Ok(url);
                }
                LinkCandidate::Claim(claim_url) => {
                    debug!("Strategy {} found claim page {}", found.strategy, claim_url);
                    if let Some(url) = self.unwrap_claim(&claim_url, &mut visited).await {
                        return Ok(url);
                    }
                }
            }
        }

        Err(ResolveError::Unresolved {
            detail_url: detail_url.to_string(),
        })
    }

    /// Follow claim pages breadth-first, at most `max_claim_hops` deep.
    ///
    /// `visited` is shared across every claim page of one candidate so a
    /// cycle between claim pages is fetched at most once.
    async fn unwrap_claim(&self, claim_url: &str, visited: &mut HashSet<String>) -> Option<String> {
        let mut pending = VecDeque::from([(claim_url.to_string(), 1usize)]);

        while let Some((url, depth)) = pending.pop_front() {
            if depth > self.config.max_claim_hops || !visited.insert(url.clone()) {
                continue;
            }

            let body = match self.fetcher.fetch(&url).await {
                Ok(body) => body,
                Err(e) => {
                    debug!("Claim page {} unavailable: {}", url, e);
                    continue;
                }
            };

            for candidate in self.extractor.claim_page_candidates(&body, &url) {
                match candidate {
                    LinkCandidate::Direct(merchant) => {
                        debug!("Claim page {} unwrapped to {}", url, merchant);
                        return Some(merchant);
                    }
                    LinkCandidate::Claim(next) => pending.push_back((next, depth + 1)),
                }
            }
        }

        None
    }

    /// `Verified -> Published`: tidy fields and stamp the deal.
    fn normalize(
        &self,
        candidate: &CandidateDeal,
        source_url: String,
        url: String,
        confidence: Option<LinkConfidence>,
    ) -> ResolvedDeal {
        let description = collapse_whitespace(&candidate.description);
        let description = truncate_chars(&description, self.config.description_limit)
            .trim_end()
            .to_string();

        let merchant = Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .unwrap_or_default();

        let image = candidate
            .image
            .as_deref()
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .and_then(|src| resolve(self.base.as_ref(), src));

        ResolvedDeal {
            title: collapse_whitespace(&candidate.title),
            description,
            url,
            source_url,
            merchant,
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            image,
            verified: true,
            confidence,
            title_zh: None,
            description_zh: None,
        }
    }
}
