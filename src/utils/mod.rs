//! Shared utility functions.
//!
//! - `html`: HTML escaping for safe rendering
//! - `text`: char-boundary-safe truncation

mod html;
mod text;

pub use html::html_escape;
pub use text::{truncate_chars, truncate_with_ellipsis};
