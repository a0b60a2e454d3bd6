//! Input compression ahead of flashcard and MCQ generation.

use crate::llm::prompts::{condense_prompt, truncate_chars, CONDENSE_PARAMS};
use crate::llm::{Completion, CompletionRequest};

/// Longer inputs are summarized before being embedded in a generation prompt
pub const CONDENSE_THRESHOLD_CHARS: usize = 3000;

/// Shrink `text` to fit a generation prompt.
///
/// Short text passes through. Long text is summarized to about 500 words;
/// if that call fails the text is truncated to the threshold instead.
pub fn condense_for_generation(client: &dyn Completion, text: &str, purpose: &str) -> String {
    if text.chars().count() <= CONDENSE_THRESHOLD_CHARS {
        return text.to_string();
    }

    let request = CompletionRequest::new(condense_prompt(text, purpose), CONDENSE_PARAMS);
    match client.complete(&request) {
        Ok(summary) if !summary.is_empty() => {
            log::debug!("condensed input from={} to={}", text.len(), summary.len());
            summary
        }
        Ok(_) => {
            log::warn!("condense outcome=empty, truncating input");
            truncate_chars(text, CONDENSE_THRESHOLD_CHARS).to_string()
        }
        Err(err) => {
            log::warn!("condense outcome=error err={err}, truncating input");
            truncate_chars(text, CONDENSE_THRESHOLD_CHARS).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::ScriptedCompletion;

    #[test]
    fn test_short_text_skips_model() {
        let client = ScriptedCompletion::new(vec![]);
        let text = "short text";

        assert_eq!(condense_for_generation(&client, text, "flashcards"), text);
        assert!(client.prompts().is_empty());
    }

    #[test]
    fn test_long_text_is_summarized() {
        let client = ScriptedCompletion::new(vec![Ok("a condensed version".to_string())]);
        let text = "word ".repeat(1000);

        let condensed = condense_for_generation(&client, &text, "MCQs");
        assert_eq!(condensed, "a condensed version");

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Summarize the following content in 500 words to create MCQs from:"));
    }

    #[test]
    fn test_failed_summary_truncates() {
        let client = ScriptedCompletion::failing();
        let text = "x".repeat(CONDENSE_THRESHOLD_CHARS + 10);

        let condensed = condense_for_generation(&client, &text, "flashcards");
        assert_eq!(condensed.len(), CONDENSE_THRESHOLD_CHARS);
    }
}
