//! Listing-page scrape: turns the aggregator's front page into candidates.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::links::collapse_whitespace;
use crate::models::CandidateDeal;

static CONTAINER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article, div").expect("container selector should parse"));
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4").expect("title selector should parse"));
static PARAGRAPH_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("paragraph selector should parse"));
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector should parse"));
static IMAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("image selector should parse"));

/// Titles shorter than this are navigation noise, not deals.
const MIN_TITLE_CHARS: usize = 5;

/// Any attribute value mentions `deal` or `post`.
fn is_deal_container(el: &ElementRef<'_>) -> bool {
    el.value().attrs().any(|(_, value)| {
        let value = value.to_ascii_lowercase();
        value.contains("deal") || value.contains("post")
    })
}

fn join_url(base: Option<&Url>, href: &str) -> String {
    base.and_then(|b| b.join(href.trim()).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.trim().to_string())
}

/// Parse listing HTML into candidate deals in page order.
///
/// The innermost matching container is used when containers nest, and a
/// detail URL is only reported once.
pub fn parse_listing(html: &str, base_url: &str) -> Vec<CandidateDeal> {
    let base = Url::parse(base_url).ok();
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut deals = Vec::new();

    for container in document.select(&CONTAINER_SELECTOR) {
        if !is_deal_container(&container) {
            continue;
        }
        let has_inner_container = container
            .select(&CONTAINER_SELECTOR)
            .any(|inner| is_deal_container(&inner));
        if has_inner_container {
            continue;
        }

        let Some(title) = container
            .select(&TITLE_SELECTOR)
            .map(|h| collapse_whitespace(&h.text().collect::<String>()))
            .find(|t| !t.is_empty())
        else {
            continue;
        };
        if title.chars().count() < MIN_TITLE_CHARS {
            debug!("Skipping listing entry with short title {:?}", title);
            continue;
        }

        let Some(href) = container
            .select(&LINK_SELECTOR)
            .filter_map(|a| a.value().attr("href"))
            .find(|h| !h.trim().is_empty())
        else {
            continue;
        };
        let detail_url = join_url(base.as_ref(), href);
        if !seen.insert(detail_url.clone()) {
            continue;
        }

        let description = container
            .select(&PARAGRAPH_SELECTOR)
            .map(|p| collapse_whitespace(&p.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let image = container
            .select(&IMAGE_SELECTOR)
            .find_map(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
            .map(|src| join_url(base.as_ref(), src));

        let mut deal = CandidateDeal::new(title, detail_url).with_description(description);
        if let Some(image) = image {
            deal = deal.with_image(image);
        }
        deals.push(deal);
    }

    debug!("Parsed {} listing entries", deals.len());
    deals
}
