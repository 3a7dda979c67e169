//! Text truncation that never splits a UTF-8 character.

/// Keep at most `limit` characters.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cap `text` at `limit` characters, ending in `...` when shortened.
pub fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept = truncate_chars(text, limit.saturating_sub(3)).trim_end();
    format!("{}...", kept)
}
