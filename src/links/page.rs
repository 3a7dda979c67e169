//! Link inventory of a single fetched page.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector should parse"));
static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[http-equiv][content]").expect("meta selector should parse"));
static IFRAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("iframe[src]").expect("iframe selector should parse"));

/// `window.location`, `location.href` and `document.location` assignments.
static SCRIPT_REDIRECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:window\.location(?:\.href)?|document\.location(?:\.href)?|location\.href)\s*=\s*["']([^"']+)["']"#,
    )
    .expect("script redirect regex should compile")
});

/// Target of a `content="5; url=..."` refresh directive.
static REFRESH_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\s*=\s*['"]?([^'";\s]+)"#).expect("refresh regex should compile")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// One `<a href>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// `href` as written in the page.
    pub raw_href: String,
    /// `href` resolved against the page URL, when it resolves.
    pub url: Option<String>,
    /// Visible text, whitespace-collapsed.
    pub text: String,
    /// Lowercased class tokens.
    pub classes: Vec<String>,
    pub target: Option<String>,
    /// Lowercased rel tokens.
    pub rel: Vec<String>,
}

impl Anchor {
    pub fn has_class_containing(&self, needle: &str) -> bool {
        self.classes.iter().any(|c| c.contains(needle))
    }

    pub fn opens_new_window(&self) -> bool {
        self.target
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("_blank"))
    }

    pub fn is_nofollow(&self) -> bool {
        self.rel.iter().any(|r| r == "nofollow")
    }
}

/// Every link-bearing construct the extraction strategies look at.
#[derive(Debug, Clone, Default)]
pub struct PageLinks {
    pub anchors: Vec<Anchor>,
    /// Targets of script-based redirects, resolved.
    pub script_redirects: Vec<String>,
    /// Targets of `<meta http-equiv="refresh">`, resolved.
    pub meta_refreshes: Vec<String>,
    /// `<iframe src>` values, resolved.
    pub iframes: Vec<String>,
}

impl PageLinks {
    /// Parse a page body. Relative links resolve against `base_url`.
    pub fn parse(body: &str, base_url: &str) -> Self {
        let base = Url::parse(base_url).ok();
        let document = Html::parse_document(body);

        let anchors = document
            .select(&ANCHOR_SELECTOR)
            .filter_map(|el| parse_anchor(el, base.as_ref()))
            .collect();

        let script_redirects = SCRIPT_REDIRECT
            .captures_iter(body)
            .filter_map(|cap| cap.get(1))
            .filter_map(|m| resolve(base.as_ref(), m.as_str()))
            .collect();

        let meta_refreshes = document
            .select(&META_SELECTOR)
            .filter(|el| {
                el.value()
                    .attr("http-equiv")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"))
            })
            .filter_map(|el| el.value().attr("content"))
            .filter_map(|content| REFRESH_URL.captures(content))
            .filter_map(|cap| cap.get(1).and_then(|m| resolve(base.as_ref(), m.as_str())))
            .collect();

        let iframes = document
            .select(&IFRAME_SELECTOR)
            .filter_map(|el| el.value().attr("src"))
            .filter_map(|src| resolve(base.as_ref(), src))
            .collect();

        Self {
            anchors,
            script_redirects,
            meta_refreshes,
            iframes,
        }
    }
}

fn parse_anchor(el: ElementRef<'_>, base: Option<&Url>) -> Option<Anchor> {
    let value = el.value();
    let raw_href = value.attr("href")?.trim().to_string();
    if raw_href.is_empty() {
        return None;
    }

    let split_tokens = |attr: &str| -> Vec<String> {
        value
            .attr(attr)
            .map(|v| v.split_whitespace().map(|t| t.to_ascii_lowercase()).collect())
            .unwrap_or_default()
    };

    Some(Anchor {
        url: resolve(base, &raw_href),
        text: collapse_whitespace(&el.text().collect::<String>()),
        classes: split_tokens("class"),
        target: value.attr("target").map(str::to_string),
        rel: split_tokens("rel"),
        raw_href,
    })
}

/// Resolve `href` against `base`, keeping only http(s) results.
pub fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    let url = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.latestfreestuff.co.uk/free-tea";

    #[test]
    fn test_parse_anchor_attributes() {
        let html = r#"<a class="Deal-Btn primary" target="_blank" rel="nofollow sponsored"
            href="https://brand.example.com/offer">  Get   Deal </a>"#;
        let page = PageLinks::parse(html, BASE);
        assert_eq!(page.anchors.len(), 1);
        let a = &page.anchors[0];
        assert_eq!(a.text, "Get Deal");
        assert!(a.has_class_containing("deal-btn"));
        assert!(a.opens_new_window());
        assert!(a.is_nofollow());
        assert_eq!(a.url.as_deref(), Some("https://brand.example.com/offer"));
    }

    #[test]
    fn test_relative_links_resolve_against_base() {
        let page = PageLinks::parse(r#"<a href="/claim/42">Claim</a>"#, BASE);
        assert_eq!(
            page.anchors[0].url.as_deref(),
            Some("https://www.latestfreestuff.co.uk/claim/42")
        );
    }

    #[test]
    fn test_non_http_hrefs_have_no_url() {
        let page = PageLinks::parse(
            r#"<a href="javascript:void(0)">x</a><a href="mailto:a@b.com">y</a><a href="">z</a>"#,
            BASE,
        );
        assert_eq!(page.anchors.len(), 2);
        assert!(page.anchors.iter().all(|a| a.url.is_none()));
    }

    #[test]
    fn test_script_meta_and_iframe_targets() {
        let html = r#"
            <html><head>
            <meta http-equiv="Refresh" content="3; URL='https://brand.example.com/landing'">
            </head><body>
            <script>setTimeout(function() { window.location.href = "https://shop.example.org/go"; }, 10);</script>
            <iframe src="//embed.example.net/widget"></iframe>
            </body></html>"#;
        let page = PageLinks::parse(html, BASE);
        assert_eq!(page.meta_refreshes, vec!["https://brand.example.com/landing"]);
        assert_eq!(page.script_redirects, vec!["https://shop.example.org/go"]);
        assert_eq!(page.iframes, vec!["https://embed.example.net/widget"]);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace(""), "");
    }
}
