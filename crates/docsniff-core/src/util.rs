//! Small text helpers shared by extraction and prompt rendering.

/// Truncate to at most `max_chars` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}

/// Collapse whitespace runs into single spaces and trim the ends.
pub fn tidy_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
