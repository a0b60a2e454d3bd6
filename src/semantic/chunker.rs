//! Passage splitting for uploaded documents.
//!
//! A passage is one blank-line separated paragraph of the document:
//! 1. Split on runs of whitespace-only lines
//! 2. Trim each segment
//! 3. Drop segments that are empty after trimming

/// Split document text into ordered, non-empty passages.
///
/// A document without blank lines comes back as a single passage.
pub fn split_into_passages(text: &str) -> Vec<String> {
    let mut passages = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut current, &mut passages);
        } else {
            current.push(line);
        }
    }
    flush(&mut current, &mut passages);

    passages
}

fn flush(lines: &mut Vec<&str>, passages: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }

    let passage = lines.join("\n");
    let passage = passage.trim();
    if !passage.is_empty() {
        passages.push(passage.to_string());
    }
    lines.clear();
}
