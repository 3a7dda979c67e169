//! End-to-end scenarios: resolve, select and publish against an in-memory site.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::tempdir;

use dealwire::links::LinkClassifier;
use dealwire::models::CandidateDeal;
use dealwire::pipeline::{DealResolver, DealSelector, PublishError, ResolverConfig};
use dealwire::publish::{PatchAction, SectionLabels, SectionPatcher, SectionPublisher};
use dealwire::scrapers::{parse_listing, FetchError, PageFetcher, ProbeMethod};

const BASE: &str = "https://www.latestfreestuff.co.uk";

/// Aggregator detail pages keyed by URL; merchant links are live unless dead.
#[derive(Default)]
struct StubSite {
    pages: HashMap<String, String>,
    dead: HashSet<String>,
}

impl StubSite {
    /// Candidate `i` resolves through a call-to-action button to shop `i`.
    fn with_deal(mut self, i: usize) -> Self {
        self.pages.insert(
            detail_url(i),
            format!(
                r#"<html><body>
                <a href="https://www.facebook.com/sharer/sharer.php?u=x">Share</a>
                <a class="btn deal-btn" href="{}">Get Deal</a>
                </body></html>"#,
                merchant_url(i)
            ),
        );
        self
    }

    fn with_dead_deal(mut self, i: usize) -> Self {
        self = self.with_deal(i);
        self.dead.insert(merchant_url(i));
        self
    }
}

#[async_trait]
impl PageFetcher for StubSite {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.pages.get(url).cloned().ok_or(FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }

    async fn probe(&self, url: &str, _: ProbeMethod) -> Result<u16, FetchError> {
        if self.dead.contains(url) {
            Ok(410)
        } else {
            Ok(200)
        }
    }
}

fn detail_url(i: usize) -> String {
    format!("{}/freebie-{}", BASE, i)
}

fn merchant_url(i: usize) -> String {
    format!("https://shop{}.example.com/free-sample", i)
}

fn candidates(n: usize) -> Vec<CandidateDeal> {
    (1..=n)
        .map(|i| CandidateDeal::new(format!("Freebie number {}", i), format!("/freebie-{}", i)))
        .collect()
}

fn config() -> ResolverConfig {
    ResolverConfig {
        candidate_delay: Duration::ZERO,
        ..Default::default()
    }
}

fn publisher() -> SectionPublisher {
    SectionPublisher::new("deals", "benefits", SectionLabels::default()).unwrap()
}

const DOCUMENT_WITH_SECTION: &str = r#"<!DOCTYPE html>
<html>
<body>
    <section id="hero">Hello</section>
    <section id="deals" class="daily-deals">
        <p>stale deals</p>
    </section>
    <section id="benefits" class="benefits">Benefits</section>
</body>
</html>
"#;

const DOCUMENT_WITH_ANCHOR: &str = r#"<!DOCTYPE html>
<html>
<body>
    <section id="hero">Hello</section>
    <section id="benefits" class="benefits">Benefits</section>
</body>
</html>
"#;

#[tokio::test]
async fn test_seven_of_ten_resolve_and_first_six_replace_section() {
    // Candidates 3 and 8 have no detail page, 5 has a dead merchant link
    let mut site = StubSite::default();
    for i in [1, 2, 4, 6, 7, 9, 10] {
        site = site.with_deal(i);
    }
    let site = site.with_dead_deal(5);

    let resolver = DealResolver::new(site, config());
    let report = resolver.resolve_all(&candidates(10)).await;
    assert_eq!(report.deals.len(), 7);
    assert_eq!(report.rejected.len(), 3);

    let mut selector = DealSelector::new(LinkClassifier::default(), 6);
    let selection = selector.select(&report.deals);
    assert!(selection.meets_requirement);
    assert_eq!(selection.total_real, 7);
    let chosen: Vec<_> = selection.chosen.iter().map(|d| d.url.clone()).collect();
    let expected: Vec<_> = [1, 2, 4, 6, 7, 9].into_iter().map(merchant_url).collect();
    assert_eq!(chosen, expected);

    let dir = tempdir().unwrap();
    let doc = dir.path().join("index.html");
    fs::write(&doc, DOCUMENT_WITH_SECTION).unwrap();

    let outcome = publisher().publish(&selection, &doc, None).unwrap();
    assert_eq!(outcome.action, PatchAction::Replaced);
    assert_eq!(outcome.section.deal_count, 6);

    let written = fs::read_to_string(&doc).unwrap();
    assert!(!written.contains("stale deals"));
    assert!(written.contains(&merchant_url(9)));
    assert!(!written.contains(&merchant_url(10)));
    assert!(written.contains(r#"<section id="hero">Hello</section>"#));
    assert_eq!(
        SectionPatcher::new("deals", "benefits")
            .unwrap()
            .count_sections(&written),
        1
    );
}

#[tokio::test]
async fn test_four_real_deals_leave_document_byte_identical() {
    let mut site = StubSite::default();
    for i in 1..=4 {
        site = site.with_deal(i);
    }
    let resolver = DealResolver::new(site, config());
    let report = resolver.resolve_all(&candidates(10)).await;

    let mut selector = DealSelector::new(LinkClassifier::default(), 6);
    let selection = selector.select(&report.deals);
    assert!(!selection.meets_requirement);
    assert_eq!(selection.total_real, 4);

    let dir = tempdir().unwrap();
    let doc = dir.path().join("index.html");
    fs::write(&doc, DOCUMENT_WITH_SECTION).unwrap();
    let backups = dir.path().join("backups");

    let err = publisher()
        .publish(&selection, &doc, Some(&backups))
        .unwrap_err();
    assert!(matches!(
        err,
        PublishError::InsufficientRealDeals {
            found: 4,
            required: 6
        }
    ));
    assert_eq!(fs::read(&doc).unwrap(), DOCUMENT_WITH_SECTION.as_bytes());
    assert!(!backups.exists());
}

#[tokio::test]
async fn test_insert_before_anchor_then_replace() {
    let mut site = StubSite::default();
    for i in 1..=6 {
        site = site.with_deal(i);
    }
    let resolver = DealResolver::new(site, config());
    let report = resolver.resolve_all(&candidates(6)).await;

    let dir = tempdir().unwrap();
    let doc = dir.path().join("index.html");
    fs::write(&doc, DOCUMENT_WITH_ANCHOR).unwrap();

    let mut selector = DealSelector::new(LinkClassifier::default(), 6);
    let selection = selector.select(&report.deals);
    let first = publisher().publish(&selection, &doc, None).unwrap();
    assert_eq!(first.action, PatchAction::Inserted);

    let written = fs::read_to_string(&doc).unwrap();
    let deals_at = written.find(r#"id="deals""#).unwrap();
    let benefits_at = written.find(r#"id="benefits""#).unwrap();
    assert!(deals_at < benefits_at);

    // A new run re-selects from scratch
    selector.reset();
    let selection = selector.select(&report.deals);
    let second = publisher().publish(&selection, &doc, None).unwrap();
    assert_eq!(second.action, PatchAction::Replaced);

    let written = fs::read_to_string(&doc).unwrap();
    assert_eq!(written.matches(r#"id="deals""#).count(), 1);
    assert_eq!(written.matches(r#"id="benefits""#).count(), 1);
}

#[tokio::test]
async fn test_duplicate_merchant_links_count_once() {
    // Two listings point at the same merchant page
    let mut site = StubSite::default().with_deal(1);
    let body = site.pages[&detail_url(1)].clone();
    site.pages.insert(detail_url(2), body);

    let resolver = DealResolver::new(site, config());
    let report = resolver.resolve_all(&candidates(2)).await;
    assert_eq!(report.deals.len(), 2);

    let mut selector = DealSelector::new(LinkClassifier::default(), 2);
    let selection = selector.select(&report.deals);
    assert_eq!(selection.total_real, 1);
    assert_eq!(selection.chosen[0].title, "Freebie number 1");
    assert!(!selection.meets_requirement);
}

#[tokio::test]
async fn test_candidates_are_spaced_by_delay() {
    let mut site = StubSite::default();
    for i in 1..=3 {
        site = site.with_deal(i);
    }
    let resolver = DealResolver::new(
        site,
        ResolverConfig {
            candidate_delay: Duration::from_millis(20),
            ..Default::default()
        },
    );

    let start = Instant::now();
    let report = resolver.resolve_all(&candidates(3)).await;
    assert_eq!(report.deals.len(), 3);
    assert!(start.elapsed() >= Duration::from_millis(40));
}

#[tokio::test]
async fn test_listing_feeds_resolver() {
    let listing = r#"
        <div class="post"><h2>Freebie number 1</h2><p>Sample</p><a href="/freebie-1">More</a></div>
        <div class="post"><h2>Freebie number 2</h2><p>Sample</p><a href="/freebie-2">More</a></div>"#;
    let parsed = parse_listing(listing, BASE);
    assert_eq!(parsed.len(), 2);

    let site = StubSite::default().with_deal(1).with_deal(2);
    let resolver = DealResolver::new(site, config());
    let report = resolver.resolve_all(&parsed).await;
    let urls: Vec<_> = report.deals.iter().map(|d| d.url.clone()).collect();
    assert_eq!(urls, vec![merchant_url(1), merchant_url(2)]);
    assert_eq!(report.deals[0].source_url, detail_url(1));
}
