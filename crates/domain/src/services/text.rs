//! Text handling for chat messages and source documents.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\b\w+\b").unwrap();
}

/// Upper bound on stored message length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 1000;

fn escape(ch: char) -> Option<&'static str> {
    match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#x27;"),
        '\n' => Some("<br>"),
        _ => None,
    }
}

/// Trims, truncates, HTML-escapes and converts newlines to `<br>`.
///
/// Returns `None` when nothing is left. Input is cut at 1000 characters, and
/// further if needed so the escaped result also stays within 1000 characters
/// without splitting an entity.
pub fn sanitize_message(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len().min(MAX_MESSAGE_CHARS));
    let mut len = 0;

    for ch in trimmed.chars().take(MAX_MESSAGE_CHARS) {
        let piece_len = escape(ch).map_or(1, str::len);
        if len + piece_len > MAX_MESSAGE_CHARS {
            break;
        }
        match escape(ch) {
            Some(entity) => out.push_str(entity),
            None => out.push(ch),
        }
        len += piece_len;
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Counts word-character runs.
pub fn count_words(text: &str) -> i32 {
    i32::try_from(WORD.find_iter(text).count()).unwrap_or(i32::MAX)
}
