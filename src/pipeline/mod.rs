//! Resolution and selection stages of the deal pipeline.

mod error;
mod resolver;
mod selector;

pub use error::{PublishError, ResolveError, Stage};
pub use resolver::{DealResolver, Rejection, ResolveReport, ResolverConfig};
pub use selector::{DealSelector, Selection, REQUIRED_REAL_DEALS};
