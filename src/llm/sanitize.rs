//! Removal of model reasoning markup from generated text.
//!
//! Reasoning models wrap their scratch work in `<think>...</think>`. Every
//! removed block or stray tag is replaced by a single space so the text on
//! either side never fuses into a new tag, which keeps both functions
//! idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

static THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think block regex"));

static UNTERMINATED_THINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*").expect("valid unterminated think regex"));

static STRAY_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</think>").expect("valid closing tag regex"));

/// Remove reasoning blocks but keep the line layout.
///
/// Structured parsers need the newlines that [`clean_generated_text`]
/// collapses.
pub fn strip_reasoning(text: &str) -> String {
    let text = THINK_BLOCK.replace_all(text, " ");
    let text = UNTERMINATED_THINK.replace_all(&text, " ");
    let text = STRAY_CLOSE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Remove reasoning blocks, collapse whitespace runs and trim.
pub fn clean_generated_text(text: &str) -> String {
    strip_reasoning(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
