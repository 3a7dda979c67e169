//! Selection of the published batch from resolved deals.

use std::collections::HashSet;

use crate::links::LinkClassifier;
use crate::models::ResolvedDeal;

/// Number of deals a publication needs.
pub const REQUIRED_REAL_DEALS: usize = 6;

/// Result of one selection pass.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// At most `required_count` deals in encounter order.
    pub chosen: Vec<ResolvedDeal>,
    /// Whether the distinct real deals found reached `required_count`.
    pub meets_requirement: bool,
    /// Distinct real deals found, before truncation.
    pub total_real: usize,
    /// Count the batch was judged against.
    pub required: usize,
}

/// Filters, deduplicates and gates resolved deals.
///
/// Owns the run's seen-URL set; URLs chosen by earlier `select` calls are
/// treated as duplicates until [`DealSelector::reset`].
pub struct DealSelector {
    classifier: LinkClassifier,
    required_count: usize,
    seen: HashSet<String>,
}

impl DealSelector {
    pub fn new(classifier: LinkClassifier, required_count: usize) -> Self {
        Self {
            classifier,
            required_count,
            seen: HashSet::new(),
        }
    }

    pub fn required_count(&self) -> usize {
        self.required_count
    }

    pub fn select(&mut self, deals: &[ResolvedDeal]) -> Selection {
        let mut real = Vec::new();

        for deal in deals {
            let url = deal.url.trim();
            if !self.classifier.is_merchant_link(url) {
                continue;
            }
            if !self.seen.insert(url.to_string()) {
                continue;
            }
            let mut deal = deal.clone();
            deal.url = url.to_string();
            real.push(deal);
        }

        let total_real = real.len();
        real.truncate(self.required_count);

        Selection {
            chosen: real,
            meets_requirement: total_real >= self.required_count,
            total_real,
            required: self.required_count,
        }
    }

    /// Forget every URL seen so far.
    pub fn reset(&mut self) {
        self.seen.clear();
    }
}

impl Default for DealSelector {
    fn default() -> Self {
        Self::new(LinkClassifier::default(), REQUIRED_REAL_DEALS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(url: &str) -> ResolvedDeal {
        ResolvedDeal {
            title: format!("Deal {}", url),
            description: String::new(),
            url: url.to_string(),
            source_url: "https://www.latestfreestuff.co.uk/x".to_string(),
            merchant: String::new(),
            date: "2026-10-18".to_string(),
            image: None,
            verified: true,
            confidence: None,
            title_zh: None,
            description_zh: None,
        }
    }

    fn urls(n: usize) -> Vec<ResolvedDeal> {
        (1..=n)
            .map(|i| deal(&format!("https://shop{}.example.com/offer", i)))
            .collect()
    }

    #[test]
    fn test_truncates_and_meets_requirement() {
        let mut selector = DealSelector::default();
        let selection = selector.select(&urls(7));
        assert_eq!(selection.chosen.len(), 6);
        assert_eq!(selection.total_real, 7);
        assert!(selection.meets_requirement);
        assert_eq!(selection.chosen[0].url, "https://shop1.example.com/offer");
        assert_eq!(selection.chosen[5].url, "https://shop6.example.com/offer");
    }

    #[test]
    fn test_insufficient_deals() {
        let mut selector = DealSelector::default();
        let selection = selector.select(&urls(4));
        assert_eq!(selection.chosen.len(), 4);
        assert_eq!(selection.total_real, 4);
        assert!(!selection.meets_requirement);
    }

    #[test]
    fn test_dedup_by_trimmed_url_first_wins() {
        let mut selector = DealSelector::new(LinkClassifier::default(), 2);
        let mut first = deal("https://shop.example.com/offer");
        first.title = "first".to_string();
        let mut second = deal("  https://shop.example.com/offer ");
        second.title = "second".to_string();

        let selection = selector.select(&[first, second]);
        assert_eq!(selection.total_real, 1);
        assert_eq!(selection.chosen[0].title, "first");
        assert!(!selection.meets_requirement);
    }

    #[test]
    fn test_filters_non_merchant_links() {
        let mut selector = DealSelector::new(LinkClassifier::default(), 1);
        let selection = selector.select(&[
            deal("https://www.latestfreestuff.co.uk/free-tea"),
            deal("https://www.facebook.com/brand"),
            deal("not a url"),
            deal(" https://brand.example.com/sample "),
        ]);
        assert_eq!(selection.total_real, 1);
        assert_eq!(selection.chosen[0].url, "https://brand.example.com/sample");
    }

    #[test]
    fn test_seen_set_spans_calls_until_reset() {
        let mut selector = DealSelector::new(LinkClassifier::default(), 1);
        assert_eq!(selector.select(&urls(1)).total_real, 1);
        assert_eq!(selector.select(&urls(1)).total_real, 0);
        selector.reset();
        assert_eq!(selector.select(&urls(1)).total_real, 1);
    }
}
