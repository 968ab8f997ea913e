// Output formatting for the CLI.

pub mod terminal;

/// Shorten `text` to `max_chars` characters, marking the cut with "...".
///
/// Counts characters, not bytes, so accented Spanish and German text never
/// splits mid-codepoint.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
