//! Data models for dealwire.

mod deal;

pub use deal::{CandidateDeal, LinkConfidence, ResolvedDeal};
