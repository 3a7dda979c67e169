//! HTML rendering of the managed deals section.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::ResolvedDeal;
use crate::utils::{html_escape, truncate_with_ellipsis};

/// Card description cap in characters, including the ellipsis.
const CARD_DESCRIPTION_LIMIT: usize = 160;

const CARD_INDENT: &str = "                    ";

/// Visible text used by the rendered section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionLabels {
    pub heading: String,
    /// Follows the deal count in the header.
    pub count_suffix: String,
    /// Precedes the timestamp in the update line.
    pub updated_prefix: String,
    /// Follows the timestamp in the update line.
    pub updated_note: String,
    pub badge: String,
    pub call_to_action: String,
    pub image_alt: String,
    pub empty: String,
    pub unknown_domain: String,
}

impl Default for SectionLabels {
    fn default() -> Self {
        Self {
            heading: "🎁 今日英国优惠精选".to_string(),
            count_suffix: "个真实商家优惠".to_string(),
            updated_prefix: "🕒 最新更新:".to_string(),
            updated_note: "✅ 提取真实优惠链接".to_string(),
            badge: "✅ 真实链接".to_string(),
            call_to_action: "🎁 立即领取".to_string(),
            image_alt: "优惠图片".to_string(),
            empty: "暂无最新优惠，敬请关注！".to_string(),
            unknown_domain: "未知域名".to_string(),
        }
    }
}

/// A rendered fragment and the facts shown in its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedSection {
    pub html: String,
    pub header_text: String,
    pub update_text: String,
    pub deal_count: usize,
    pub timestamp: DateTime<Local>,
}

/// Render `deals` as one `<section>` carrying `section_id`.
///
/// An empty batch renders a placeholder card so the container is never
/// structurally empty.
pub fn render_section(
    deals: &[ResolvedDeal],
    section_id: &str,
    labels: &SectionLabels,
    timestamp: DateTime<Local>,
) -> PublishedSection {
    let formatted_time = timestamp.format("%Y-%m-%d %H:%M:%S");
    let header_text = format!("{} - {} {}", labels.heading, deals.len(), labels.count_suffix);
    let update_text = format!(
        "{} {} | {}",
        labels.updated_prefix, formatted_time, labels.updated_note
    );

    let items = if deals.is_empty() {
        format!(
            "{}<div class=\"deal-item\">{}</div>",
            CARD_INDENT,
            html_escape(&labels.empty)
        )
    } else {
        deals
            .iter()
            .map(|deal| render_card(deal, labels))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let html = [
        format!(
            "    <section id=\"{}\" class=\"daily-deals\">",
            html_escape(section_id)
        ),
        "        <div class=\"container\">".to_string(),
        "            <div class=\"daily-deals-section\">".to_string(),
        format!("                <h2>{}</h2>", html_escape(&header_text)),
        format!(
            "                <p class=\"update-time\">{}</p>",
            html_escape(&update_text)
        ),
        "                <div class=\"deals-container\">".to_string(),
        items,
        "                </div>".to_string(),
        "            </div>".to_string(),
        "        </div>".to_string(),
        "    </section>".to_string(),
    ]
    .join("\n");

    PublishedSection {
        html,
        header_text,
        update_text,
        deal_count: deals.len(),
        timestamp,
    }
}

fn render_card(deal: &ResolvedDeal, labels: &SectionLabels) -> String {
    let title = deal.display_title().trim();
    let description = truncate_with_ellipsis(deal.display_description().trim(), CARD_DESCRIPTION_LIMIT);
    let domain = card_domain(deal).unwrap_or_else(|| labels.unknown_domain.clone());

    let mut lines = vec![
        "<div class=\"deal-item featured-deal\">".to_string(),
        format!("    <div class=\"deal-badge\">{}</div>", html_escape(&labels.badge)),
    ];
    if let Some(image) = deal.image.as_deref().filter(|i| !i.trim().is_empty()) {
        lines.push("    <div class=\"deal-image\">".to_string());
        lines.push(format!(
            "        <img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
            html_escape(image.trim()),
            html_escape(&labels.image_alt)
        ));
        lines.push("    </div>".to_string());
    }
    lines.extend([
        format!("    <h3>{}</h3>", html_escape(title)),
        format!("    <p>{}</p>", html_escape(&description)),
        "    <div class=\"deal-meta\">".to_string(),
        format!("        <span class=\"date\">📅 {}</span>", html_escape(&deal.date)),
        format!("        <span class=\"domain\">🌐 {}</span>", html_escape(&domain)),
        format!(
            "        <a href=\"{}\" target=\"_blank\" rel=\"nofollow noopener\" class=\"deal-link btn-primary\">{}</a>",
            html_escape(&deal.url),
            html_escape(&labels.call_to_action)
        ),
        "    </div>".to_string(),
        "</div>".to_string(),
    ]);

    lines
        .iter()
        .map(|line| format!("{}{}", CARD_INDENT, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn card_domain(deal: &ResolvedDeal) -> Option<String> {
    if !deal.merchant.trim().is_empty() {
        return Some(deal.merchant.trim().to_string());
    }
    Url::parse(&deal.url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap()
    }

    fn deal(title: &str, url: &str) -> ResolvedDeal {
        ResolvedDeal {
            title: title.to_string(),
            description: "A free sample".to_string(),
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

    #[test]
    fn test_render_header_and_cards() {
        let deals = vec![
            deal("Free Tea", "https://brand.example.com/tea?a=1&b=2"),
            deal("Free Coffee", "https://shop.example.org/coffee"),
        ];
        let section = render_section(&deals, "deals", &SectionLabels::default(), at());

        assert_eq!(section.deal_count, 2);
        assert!(section.header_text.contains(" 2 "));
        assert!(section.update_text.contains("2026-10-18 09:30:00"));
        assert!(section.html.starts_with("    <section id=\"deals\" class=\"daily-deals\">"));
        assert!(section.html.ends_with("</section>"));
        assert_eq!(section.html.matches("class=\"deal-item featured-deal\"").count(), 2);
        assert!(section.html.contains("href=\"https://brand.example.com/tea?a=1&amp;b=2\""));
        assert!(section.html.contains("rel=\"nofollow noopener\""));
        assert!(section.html.contains("🌐 brand.example.com"));
        assert!(!section.html.contains("deal-image"));
    }

    #[test]
    fn test_render_empty_batch_has_placeholder() {
        let section = render_section(&[], "deals", &SectionLabels::default(), at());
        assert_eq!(section.deal_count, 0);
        assert!(section.html.contains("<div class=\"deal-item\">"));
        assert!(section.html.contains(&SectionLabels::default().empty));
    }

    #[test]
    fn test_render_escapes_and_truncates() {
        let mut d = deal("<b>Tea</b> & Biscuits", "https://brand.example.com/tea");
        d.description = "x".repeat(200);
        d.image = Some("https://brand.example.com/tea.jpg".to_string());
        d.merchant = "brand.example.com".to_string();
        let section = render_section(&[d], "deals", &SectionLabels::default(), at());

        assert!(section.html.contains("&lt;b&gt;Tea&lt;/b&gt; &amp; Biscuits"));
        assert!(section.html.contains(&format!("<p>{}...</p>", "x".repeat(157))));
        assert!(section.html.contains("loading=\"lazy\""));
    }

    #[test]
    fn test_render_prefers_translation() {
        let d = deal("Free Tea", "https://brand.example.com/tea")
            .with_translation("免费 Tea".to_string(), "免费样品".to_string());
        let section = render_section(&[d], "deals", &SectionLabels::default(), at());
        assert!(section.html.contains("<h3>免费 Tea</h3>"));
        assert!(section.html.contains("<p>免费样品</p>"));
    }
}
