//! Pipeline error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::links::DenyReason;
use crate::scrapers::FetchError;

/// Why a single candidate was dropped. Never aborts the batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Invalid candidate: {0}")]
    InvalidCandidate(String),
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("No merchant link found on {detail_url}")]
    Unresolved { detail_url: String },
    #[error("Rejected {url}: {reason}")]
    Classification { url: String, reason: DenyReason },
    #[error("Link is not live: {url}")]
    Verification { url: String },
}

impl ResolveError {
    /// Stage the candidate reached before it was rejected.
    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidCandidate(_) | Self::Fetch(_) | Self::Unresolved { .. } => Stage::Raw,
            Self::Classification { .. } => Stage::Extracted,
            Self::Verification { .. } => Stage::Classified,
        }
    }
}

/// Per-candidate lifecycle position. `Published` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Raw,
    Extracted,
    Classified,
    Verified,
    Published,
    Rejected,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Extracted => "extracted",
            Self::Classified => "classified",
            Self::Verified => "verified",
            Self::Published => "published",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run-fatal publication errors.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Only {found} real deals found, {required} required; document left unchanged")]
    InsufficientRealDeals { found: usize, required: usize },
    #[error("Document error at {}: {source}", .path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Deal records error at {}: {message}", .path.display())]
    Records { path: PathBuf, message: String },
    #[error("Invalid section marker: {0}")]
    Marker(#[from] regex::Error),
    #[error("Invalid element id {id:?}: use letters, digits, '-', '_', ':' or '.'")]
    InvalidId { id: String },
}

impl PublishError {
    pub fn document(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Document {
            path: path.into(),
            source,
        }
    }

    pub fn records(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Records {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
