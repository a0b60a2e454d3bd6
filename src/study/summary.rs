//! Document summaries.
//!
//! Text up to one window is summarized in a single call. Longer text is
//! summarized window by window and the partial summaries are combined in a
//! final call.

use serde::Serialize;

use crate::llm::prompts::{combine_summaries_prompt, summary_prompt, window_summary_prompt, SUMMARY_PARAMS};
use crate::llm::{Completion, CompletionRequest, Focus};

/// Characters per summarization window
pub const SUMMARY_WINDOW_CHARS: usize = 10_000;

/// Smallest per-window word target in multi-window mode
const MIN_WINDOW_WORDS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    /// Word count of the summarized text
    pub original_length: usize,
    pub requested_words: usize,
    pub focus: String,
    pub summary_text: String,
}

pub fn summarize(client: &dyn Completion, text: &str, words: usize, focus: &Focus) -> SummaryRecord {
    let windows = split_windows(text, SUMMARY_WINDOW_CHARS);

    let summary_text = if windows.len() <= 1 {
        let request = CompletionRequest::new(summary_prompt(text, words, focus), SUMMARY_PARAMS);
        client.complete_or_report(&request)
    } else {
        let words_per_window = (words / windows.len()).max(MIN_WINDOW_WORDS);
        log::info!(
            "summarizing windows={} words_per_window={words_per_window}",
            windows.len()
        );

        let partials: Vec<String> = windows
            .iter()
            .map(|window| {
                let request =
                    CompletionRequest::new(window_summary_prompt(window, words_per_window), SUMMARY_PARAMS);
                client.complete_or_report(&request)
            })
            .collect();

        let request =
            CompletionRequest::new(combine_summaries_prompt(&partials, words, focus), SUMMARY_PARAMS);
        client.complete_or_report(&request)
    };

    SummaryRecord {
        original_length: text.split_whitespace().count(),
        requested_words: words,
        focus: focus.to_string(),
        summary_text,
    }
}

/// Split into consecutive slices of at most `size` characters.
fn split_windows(text: &str, size: usize) -> Vec<&str> {
    let mut windows = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == size {
            windows.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        windows.push(&text[start..]);
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::ScriptedCompletion;

    #[test]
    fn test_split_windows() {
        assert!(split_windows("", 3).is_empty());
        assert_eq!(split_windows("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(split_windows("abcdef", 3), vec!["abc", "def"]);
        assert_eq!(split_windows("ééé", 2), vec!["éé", "é"]);
    }

    #[test]
    fn test_single_window_single_call() {
        let client = ScriptedCompletion::new(vec![Ok("<think>x</think> Short summary.".to_string())]);
        let summary = summarize(&client, "one two three", 200, &Focus::EntireDocument);

        assert_eq!(summary.summary_text, "Short summary.");
        assert_eq!(summary.original_length, 3);
        assert_eq!(summary.requested_words, 200);

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("approximately 200 words"));
        assert!(prompts[0].contains("one two three"));
    }

    #[test]
    fn test_multi_window_map_then_combine() {
        let client = ScriptedCompletion::new(vec![
            Ok("part one".to_string()),
            Ok("part two".to_string()),
            Ok("combined".to_string()),
        ]);
        let text = "a".repeat(SUMMARY_WINDOW_CHARS + 1);
        let focus = Focus::Concept("mitosis".to_string());

        let summary = summarize(&client, &text, 40, &focus);
        assert_eq!(summary.summary_text, "combined");
        assert_eq!(summary.focus, "mitosis");

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].starts_with("Create a brief summary of about 30 words"));
        assert!(prompts[2].contains("part one part two"));
        assert!(prompts[2].ends_with("Focus: mitosis"));
    }

    #[test]
    fn test_failure_is_reported_in_text() {
        let client = ScriptedCompletion::failing();
        let summary = summarize(&client, "text", 100, &Focus::EntireDocument);
        assert!(summary.summary_text.starts_with("Error querying completion API"));
    }
}
