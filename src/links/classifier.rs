//! Trust classification of candidate merchant URLs.
//!
//! The aggregator has no stable markup, so classification degrades in tiers:
//! a deny-list runs first, then a curated retailer allowlist, then deal
//! keywords, and finally a plain "external and long enough" fallback.

use url::Url;

use crate::models::LinkConfidence;

/// Host of the aggregator whose pages are being unwrapped.
pub const DEFAULT_AGGREGATOR_HOST: &str = "latestfreestuff.co.uk";

/// Curated UK retail, voucher and subscription domains.
pub const TRUSTED_DOMAINS: &[&str] = &[
    "amazon.co.uk", "amazon.com", "ebay.co.uk", "ebay.com",
    "argos.co.uk", "currys.co.uk", "johnlewis.com", "marksandspencer.com",
    "tesco.com", "asda.com", "sainsburys.co.uk", "morrisons.com",
    "boots.com", "superdrug.com", "next.co.uk", "hm.com",
    "zara.com", "asos.com", "boohoo.com", "prettylittlething.com",
    "topshop.com", "newlook.com", "primark.com", "tkmaxx.com",
    "virginmedia.com", "octopus.energy", "bulb.co.uk", "edf.co.uk",
    "groupon.co.uk", "wowcher.co.uk", "vouchercodes.co.uk",
    "hotukdeals.com", "myvouchercodes.co.uk", "retailmenot.com",
    "expedia.co.uk", "booking.com", "hotels.com", "lastminute.com",
    "ryanair.com", "easyjet.com", "ba.com", "trainline.com",
    "mcdonalds.co.uk", "kfc.co.uk", "pizzahut.co.uk", "dominos.co.uk",
    "spotify.com", "netflix.com", "disneyplus.com", "audible.co.uk",
    "whitworths.co.uk", "discoverysample.com",
];

/// Social, search, analytics, font and CDN hosts that never carry offers.
pub const EXCLUDED_HOSTS: &[&str] = &[
    "facebook.com", "fb.com", "twitter.com", "x.com", "instagram.com",
    "youtube.com", "youtu.be", "linkedin.com", "pinterest.com", "tiktok.com",
    "reddit.com", "whatsapp.com", "t.me",
    "google.com", "bing.com", "yahoo.com", "duckduckgo.com",
    "google-analytics.com", "googletagmanager.com", "googlesyndication.com",
    "googleadservices.com", "doubleclick.net",
    "googleapis.com", "gstatic.com", "cloudflare.com", "jsdelivr.net",
    "gravatar.com", "wp.com",
];

/// Keywords that make an external URL plausible as an offer link.
pub const DEAL_KEYWORDS: &[&str] = &[
    "deal", "offer", "discount", "coupon", "promo", "sale",
    "shop", "store", "buy", "checkout", "cart", "order",
    "voucher", "code", "cashback", "reward",
];

/// Path segments for legal and cookie pages.
const BOILERPLATE_SEGMENTS: &[&str] = &[
    "privacy", "privacy-policy", "privacy-notice",
    "terms", "terms-and-conditions", "terms-of-service", "terms-of-use",
    "cookies", "cookie-policy", "cookie-notice",
];

const ASSET_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".webp", ".bmp",
    ".css", ".js", ".json", ".xml",
    ".pdf", ".doc", ".docx", ".zip", ".rar", ".gz", ".exe", ".dmg",
];

const SHARE_PATTERNS: &[&str] = &[
    "sharer", "intent/tweet", "pin/create", "sharearticle", "/sharing/", "recaptcha",
];

/// Path segments that mark a share endpoint on any host.
const SHARE_SEGMENTS: &[&str] = &["share"];

/// URLs at or below this length are only accepted by domain or keyword.
const FALLBACK_MIN_LENGTH: usize = 15;

/// Minimum length for a claim-page merchant link.
const MERCHANT_MIN_LENGTH: usize = 10;

/// Why a URL was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotHttp,
    Aggregator,
    ExcludedHost,
    BoilerplatePath,
    AssetPath,
    ShareIntent,
    TooShort,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotHttp => "not an absolute http(s) URL",
            Self::Aggregator => "aggregator-hosted",
            Self::ExcludedHost => "excluded host",
            Self::BoilerplatePath => "boilerplate path",
            Self::AssetPath => "asset or document path",
            Self::ShareIntent => "social share intent",
            Self::TooShort => "too short to trust",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged outcome of classifying one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkVerdict {
    Denied(DenyReason),
    AllowedByDomain,
    AllowedByKeyword,
    AllowedByFallback,
}

impl LinkVerdict {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Denied(_))
    }

    pub fn confidence(&self) -> Option<LinkConfidence> {
        match self {
            Self::Denied(_) => None,
            Self::AllowedByDomain => Some(LinkConfidence::Domain),
            Self::AllowedByKeyword => Some(LinkConfidence::Keyword),
            Self::AllowedByFallback => Some(LinkConfidence::Fallback),
        }
    }
}

/// Lowercased host of an absolute URL, without a leading `www.`.
pub fn normalized_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// True when `host` is `domain` or one of its subdomains.
pub fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Decides whether candidate URLs are real merchant links.
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    aggregator_host: String,
    extra_trusted: Vec<String>,
}

impl Default for LinkClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_AGGREGATOR_HOST)
    }
}

impl LinkClassifier {
    pub fn new(aggregator_host: &str) -> Self {
        let host = aggregator_host.trim().to_ascii_lowercase();
        Self {
            aggregator_host: host.strip_prefix("www.").unwrap_or(&host).to_string(),
            extra_trusted: Vec::new(),
        }
    }

    /// Build a classifier for the aggregator serving `base_url`.
    pub fn for_base_url(base_url: &str) -> Self {
        Url::parse(base_url)
            .ok()
            .and_then(|u| normalized_host(&u))
            .map(|host| Self::new(&host))
            .unwrap_or_default()
    }

    /// Add domains to the trusted allowlist.
    pub fn with_trusted_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extra_trusted.extend(
            domains
                .into_iter()
                .map(|d| d.as_ref().trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty()),
        );
        self
    }

    pub fn aggregator_host(&self) -> &str {
        &self.aggregator_host
    }

    /// True when `url` is absolute and hosted by the aggregator.
    pub fn is_aggregator_url(&self, url: &str) -> bool {
        Url::parse(url.trim())
            .ok()
            .and_then(|u| normalized_host(&u))
            .is_some_and(|host| host_matches(&host, &self.aggregator_host))
    }

    /// True when `url` is an aggregator claim page.
    pub fn is_claim_url(&self, url: &str) -> bool {
        self.is_aggregator_url(url) && url.to_ascii_lowercase().contains("/claim/")
    }

    /// Full three-tier classification.
    pub fn classify(&self, url: &str) -> LinkVerdict {
        let url = url.trim();
        let parsed = match self.parse_external(url) {
            Ok(parsed) => parsed,
            Err(reason) => return LinkVerdict::Denied(reason),
        };
        if let Some(reason) = self.deny_reason(&parsed, url) {
            return LinkVerdict::Denied(reason);
        }

        let host = normalized_host(&parsed).unwrap_or_default();
        let trusted = TRUSTED_DOMAINS
            .iter()
            .copied()
            .chain(self.extra_trusted.iter().map(String::as_str))
            .any(|domain| host_matches(&host, domain));
        if trusted {
            return LinkVerdict::AllowedByDomain;
        }

        let lower = url.to_ascii_lowercase();
        if DEAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return LinkVerdict::AllowedByKeyword;
        }

        if url.len() > FALLBACK_MIN_LENGTH {
            LinkVerdict::AllowedByFallback
        } else {
            LinkVerdict::Denied(DenyReason::TooShort)
        }
    }

    pub fn is_acceptable(&self, url: &str) -> bool {
        self.classify(url).is_allowed()
    }

    /// Deny-list check only: external, absolute, and not a social,
    /// analytics, asset, share or boilerplate link.
    pub fn is_merchant_link(&self, url: &str) -> bool {
        let url = url.trim();
        if url.len() < MERCHANT_MIN_LENGTH {
            return false;
        }
        match self.parse_external(url) {
            Ok(parsed) => self.deny_reason(&parsed, url).is_none(),
            Err(_) => false,
        }
    }

    fn parse_external(&self, url: &str) -> Result<Url, DenyReason> {
        let parsed = Url::parse(url).map_err(|_| DenyReason::NotHttp)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DenyReason::NotHttp);
        }
        let host = normalized_host(&parsed).ok_or(DenyReason::NotHttp)?;
        if host_matches(&host, &self.aggregator_host) {
            return Err(DenyReason::Aggregator);
        }
        Ok(parsed)
    }

    fn deny_reason(&self, parsed: &Url, raw: &str) -> Option<DenyReason> {
        let host = normalized_host(parsed)?;
        if EXCLUDED_HOSTS.iter().any(|d| host_matches(&host, d)) {
            return Some(DenyReason::ExcludedHost);
        }

        let path = parsed.path().to_ascii_lowercase();
        if ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            return Some(DenyReason::AssetPath);
        }

        let boilerplate = path
            .split('/')
            .any(|segment| BOILERPLATE_SEGMENTS.contains(&segment));
        if boilerplate {
            return Some(DenyReason::BoilerplatePath);
        }

        let lower = raw.to_ascii_lowercase();
        let share_segment = path
            .split('/')
            .any(|segment| SHARE_SEGMENTS.contains(&segment));
        let share_query = parsed
            .query_pairs()
            .any(|(key, _)| key.eq_ignore_ascii_case("share"));
        if share_segment || share_query || SHARE_PATTERNS.iter().any(|p| lower.contains(p)) {
            return Some(DenyReason::ShareIntent);
        }

        None
    }
}
