//! Ordered strategy cascade that finds the real offer link on a page.
//!
//! Strategies run in decreasing order of confidence. Claim-button and
//! claim-path strategies yield [`LinkCandidate::Claim`] for aggregator claim
//! pages, which the resolver unwraps with a bounded number of hops; every
//! other candidate must pass the classifier before it is offered.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::classifier::LinkClassifier;
use super::page::{Anchor, PageLinks};

/// Visible text of the aggregator's own "claim this freebie" button.
static CLAIM_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:get|claim)\s+(?:this\s+|your\s+)?(?:freebie|free\s+sample)\b|\bclaim\s+(?:it\s+)?now\b")
        .expect("claim text regex should compile")
});

/// Visible text of typical merchant call-to-action buttons.
static CTA_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:get\s+deal|visit\s+store|claim\s+deal|shop\s+now|get\s+offer|grab\s+deal)\b")
        .expect("cta text regex should compile")
});

static DEAL_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)deal|offer|promo|discount").expect("deal href regex should compile")
});

static REDIRECT_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[/?&=._-])(?:go|visit|redirect|out)(?:$|[/?&=._-])")
        .expect("redirect href regex should compile")
});

/// Class tokens used by call-to-action buttons.
pub const CTA_CLASSES: &[&str] = &[
    "deal-btn",
    "offer-btn",
    "get-deal",
    "visit-store",
    "claim-deal",
    "btn-primary",
];

/// A link discovered during unwrapping. Lives for one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCandidate {
    /// A URL that already passed classification.
    Direct(String),
    /// An aggregator claim page that must be fetched and searched.
    Claim(String),
}

impl LinkCandidate {
    pub fn url(&self) -> &str {
        match self {
            Self::Direct(url) | Self::Claim(url) => url,
        }
    }
}

/// A candidate together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundLink {
    pub strategy: &'static str,
    pub candidate: LinkCandidate,
}

/// One extraction heuristic.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// All matches on the page in document order.
    fn try_extract(&self, page: &PageLinks, classifier: &LinkClassifier) -> Vec<LinkCandidate>;
}

/// Run an anchor predicate and emit direct candidates.
fn anchors_where<F>(page: &PageLinks, predicate: F) -> Vec<LinkCandidate>
where
    F: Fn(&Anchor) -> bool,
{
    page.anchors
        .iter()
        .filter(|a| predicate(*a))
        .filter_map(|a| a.url.clone())
        .map(LinkCandidate::Direct)
        .collect()
}

/// Anchor whose text reads like "Get this freebie".
pub struct ClaimButton;

impl Strategy for ClaimButton {
    fn name(&self) -> &'static str {
        "claim-button"
    }

    fn try_extract(&self, page: &PageLinks, classifier: &LinkClassifier) -> Vec<LinkCandidate> {
        page.anchors
            .iter()
            .filter(|a| CLAIM_TEXT.is_match(&a.text))
            .filter_map(|a| a.url.as_deref())
            .map(|url| {
                if classifier.is_claim_url(url) {
                    LinkCandidate::Claim(url.to_string())
                } else {
                    LinkCandidate::Direct(url.to_string())
                }
            })
            .collect()
    }
}

/// Any anchor pointing at an aggregator claim page.
pub struct ClaimPath;

impl Strategy for ClaimPath {
    fn name(&self) -> &'static str {
        "claim-path"
    }

    fn try_extract(&self, page: &PageLinks, classifier: &LinkClassifier) -> Vec<LinkCandidate> {
        page.anchors
            .iter()
            .filter_map(|a| a.url.as_deref())
            .filter(|url| classifier.is_claim_url(url))
            .map(|url| LinkCandidate::Claim(url.to_string()))
            .collect()
    }
}

/// Anchor carrying a call-to-action class token.
pub struct CtaClass;

impl Strategy for CtaClass {
    fn name(&self) -> &'static str {
        "cta-class"
    }

    fn try_extract(&self, page: &PageLinks, _: &LinkClassifier) -> Vec<LinkCandidate> {
        anchors_where(page, |a| CTA_CLASSES.iter().any(|c| a.has_class_containing(c)))
    }
}

/// Anchor opening in a new window.
pub struct TargetBlank;

impl Strategy for TargetBlank {
    fn name(&self) -> &'static str {
        "target-blank"
    }

    fn try_extract(&self, page: &PageLinks, _: &LinkClassifier) -> Vec<LinkCandidate> {
        anchors_where(page, Anchor::opens_new_window)
    }
}

/// Anchor whose text reads like "Get Deal" or "Shop Now".
pub struct CtaText;

impl Strategy for CtaText {
    fn name(&self) -> &'static str {
        "cta-text"
    }

    fn try_extract(&self, page: &PageLinks, _: &LinkClassifier) -> Vec<LinkCandidate> {
        anchors_where(page, |a| CTA_TEXT.is_match(&a.text))
    }
}

/// Anchor marked `rel="nofollow"`.
pub struct Nofollow;

impl Strategy for Nofollow {
    fn name(&self) -> &'static str {
        "nofollow"
    }

    fn try_extract(&self, page: &PageLinks, _: &LinkClassifier) -> Vec<LinkCandidate> {
        anchors_where(page, Anchor::is_nofollow)
    }
}

/// Anchor with a generic button class.
pub struct ButtonClass;

impl Strategy for ButtonClass {
    fn name(&self) -> &'static str {
        "button-class"
    }

    fn try_extract(&self, page: &PageLinks, _: &LinkClassifier) -> Vec<LinkCandidate> {
        anchors_where(page, |a| {
            a.has_class_containing("btn") || a.has_class_containing("button")
        })
    }
}

/// Href mentioning deal, offer, promo or discount.
pub struct DealKeywordHref;

impl Strategy for DealKeywordHref {
    fn name(&self) -> &'static str {
        "deal-keyword-href"
    }

    fn try_extract(&self, page: &PageLinks, _: &LinkClassifier) -> Vec<LinkCandidate> {
        anchors_where(page, |a| DEAL_HREF.is_match(&a.raw_href))
    }
}

/// Href that looks like an outbound redirector (`/go/`, `/visit/`, ...).
pub struct RedirectKeywordHref;

impl Strategy for RedirectKeywordHref {
    fn name(&self) -> &'static str {
        "redirect-keyword-href"
    }

    fn try_extract(&self, page: &PageLinks, _: &LinkClassifier) -> Vec<LinkCandidate> {
        anchors_where(page, |a| REDIRECT_HREF.is_match(&a.raw_href))
    }
}

/// Any absolute anchor on a non-aggregator host.
pub struct ExternalHost;

impl Strategy for ExternalHost {
    fn name(&self) -> &'static str {
        "external-host"
    }

    fn try_extract(&self, page: &PageLinks, classifier: &LinkClassifier) -> Vec<LinkCandidate> {
        anchors_where(page, |a| {
            let raw = a.raw_href.to_ascii_lowercase();
            (raw.starts_with("http://") || raw.starts_with("https://"))
                && !classifier.is_aggregator_url(&a.raw_href)
        })
    }
}

/// `window.location`-style script redirects.
pub struct ScriptRedirect;

impl Strategy for ScriptRedirect {
    fn name(&self) -> &'static str {
        "script-redirect"
    }

    fn try_extract(&self, page: &PageLinks, _: &LinkClassifier) -> Vec<LinkCandidate> {
        page.script_redirects
            .iter()
            .cloned()
            .map(LinkCandidate::Direct)
            .collect()
    }
}

/// `<meta http-equiv="refresh">` target.
pub struct MetaRefresh;

impl Strategy for MetaRefresh {
    fn name(&self) -> &'static str {
        "meta-refresh"
    }

    fn try_extract(&self, page: &PageLinks, _: &LinkClassifier) -> Vec<LinkCandidate> {
        page.meta_refreshes
            .iter()
            .cloned()
            .map(LinkCandidate::Direct)
            .collect()
    }
}

/// `<iframe src>` on an external host.
pub struct ExternalIframe;

impl Strategy for ExternalIframe {
    fn name(&self) -> &'static str {
        "external-iframe"
    }

    fn try_extract(&self, page: &PageLinks, classifier: &LinkClassifier) -> Vec<LinkCandidate> {
        page.iframes
            .iter()
            .filter(|src| !classifier.is_aggregator_url(src))
            .cloned()
            .map(LinkCandidate::Direct)
            .collect()
    }
}

/// Strategies in priority order.
pub fn default_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(ClaimButton),
        Box::new(ClaimPath),
        Box::new(CtaClass),
        Box::new(TargetBlank),
        Box::new(CtaText),
        Box::new(Nofollow),
        Box::new(ButtonClass),
        Box::new(DealKeywordHref),
        Box::new(RedirectKeywordHref),
        Box::new(ExternalHost),
        Box::new(ScriptRedirect),
        Box::new(MetaRefresh),
        Box::new(ExternalIframe),
    ]
}

/// Runs the strategy cascade over detail and claim pages.
pub struct LinkExtractor {
    classifier: LinkClassifier,
    strategies: Vec<Box<dyn Strategy>>,
}

impl LinkExtractor {
    pub fn new(classifier: LinkClassifier) -> Self {
        Self::with_strategies(classifier, default_strategies())
    }

    pub fn with_strategies(classifier: LinkClassifier, strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self {
            classifier,
            strategies,
        }
    }

    pub fn classifier(&self) -> &LinkClassifier {
        &self.classifier
    }

    /// Every usable candidate on a detail page, highest priority first.
    ///
    /// Direct candidates have already passed classification. A URL appears
    /// at most once, at its highest-priority position.
    pub fn candidates(&self, body: &str, base_url: &str) -> Vec<FoundLink> {
        let page = PageLinks::parse(body, base_url);
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for strategy in &self.strategies {
            for candidate in strategy.try_extract(&page, &self.classifier) {
                let usable = match &candidate {
                    LinkCandidate::Direct(url) => self.classifier.is_acceptable(url),
                    LinkCandidate::Claim(_) => true,
                };
                if usable && seen.insert(candidate.url().to_string()) {
                    found.push(FoundLink {
                        strategy: strategy.name(),
                        candidate,
                    });
                }
            }
        }

        found
    }

    /// First acceptable direct link on the page, without following claim pages.
    pub fn extract(&self, body: &str, base_url: &str) -> Option<String> {
        self.candidates(body, base_url)
            .into_iter()
            .find_map(|found| match found.candidate {
                LinkCandidate::Direct(url) => Some(url),
                LinkCandidate::Claim(_) => None,
            })
    }

    /// Candidates on an aggregator claim page.
    ///
    /// Uses the narrower merchant-link check (any external host that is not
    /// search, social, analytics or an asset), then nested claim pages.
    pub fn claim_page_candidates(&self, body: &str, base_url: &str) -> Vec<LinkCandidate> {
        let page = PageLinks::parse(body, base_url);
        let mut seen = HashSet::new();

        let direct = page
            .anchors
            .iter()
            .filter_map(|a| a.url.as_deref())
            .chain(page.script_redirects.iter().map(String::as_str))
            .chain(page.meta_refreshes.iter().map(String::as_str))
            .filter(|url| self.classifier.is_merchant_link(url))
            .map(|url| LinkCandidate::Direct(url.to_string()));

        let nested = page
            .anchors
            .iter()
            .filter_map(|a| a.url.as_deref())
            .filter(|url| self.classifier.is_claim_url(url))
            .map(|url| LinkCandidate::Claim(url.to_string()));

        direct
            .chain(nested)
            .filter(|c| seen.insert(c.url().to_string()))
            .collect()
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new(LinkClassifier::default())
    }
}
