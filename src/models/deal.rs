//! Deal records flowing through the resolution pipeline.

use serde::{Deserialize, Serialize};

/// Raw listing record as scraped from the aggregator.
///
/// `detail_url` may be relative to the aggregator or absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDeal {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub detail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CandidateDeal {
    pub fn new(title: impl Into<String>, detail_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            detail_url: detail_url.into(),
            image: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// How strongly the classifier trusted the final merchant link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkConfidence {
    /// Host is on the curated retailer allowlist.
    Domain,
    /// URL contains a deal-related keyword.
    Keyword,
    /// Accepted only because it is external and long enough.
    Fallback,
}

impl LinkConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Keyword => "keyword",
            Self::Fallback => "fallback",
        }
    }
}

/// A deal whose merchant link was extracted, classified and verified live.
///
/// Never mutated once built; transforms produce copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDeal {
    pub title: String,
    pub description: String,
    /// Final external merchant URL.
    pub url: String,
    /// Original aggregator detail URL.
    pub source_url: String,
    /// Hostname of `url`.
    pub merchant: String,
    /// Local date the deal was resolved, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "default_verified")]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<LinkConfidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_zh: Option<String>,
}

fn default_verified() -> bool {
    true
}

impl ResolvedDeal {
    /// Title to display, preferring the translated text.
    pub fn display_title(&self) -> &str {
        self.title_zh
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.title)
    }

    /// Description to display, preferring the translated text.
    pub fn display_description(&self) -> &str {
        self.description_zh
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.description)
    }

    /// Copy of this deal with translated fields attached.
    pub fn with_translation(&self, title_zh: String, description_zh: String) -> Self {
        Self {
            title_zh: Some(title_zh),
            description_zh: Some(description_zh),
            ..self.clone()
        }
    }
}
