//! Finding, judging and probing merchant links on aggregator pages.

pub mod classifier;
pub mod extractor;
pub mod page;
mod verifier;

pub use classifier::{DenyReason, LinkClassifier, LinkVerdict};
pub use extractor::{FoundLink, LinkCandidate, LinkExtractor, Strategy};
pub use page::{collapse_whitespace, PageLinks};
pub use verifier::LinkVerifier;
