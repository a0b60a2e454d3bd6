//! Flashcard generation and parsing.
//!
//! The primary prompt asks for blank-line separated `Q:`/`A:` pairs. When
//! nothing in the reply parses, a simplified prompt is sent and its reply is
//! read with a looser line grammar. If that fails too, a placeholder card is
//! returned so callers never display an empty result.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::llm::prompts::{flashcard_fallback_prompt, flashcard_prompt, FALLBACK_PARAMS, FLASHCARD_PARAMS};
use crate::llm::{Completion, CompletionRequest, Focus};
use crate::study::condense::condense_for_generation;

const QUESTION_MARKER: &str = "Q:";
const ANSWER_MARKER: &str = "A:";

static LIST_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d+\s*[.)]|[-*•])\s*").expect("valid list prefix regex"));

static INLINE_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:Q|Question)\s*:\s*(.+?)\s+(?:A|Answer)\s*:\s*(.+)$").expect("valid inline pair regex")
});

static LOOSE_QUESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:Q|Question)\s*:\s*(.+)$").expect("valid loose question regex"));

static LOOSE_ANSWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:A|Answer)\s*:\s*(.+)$").expect("valid loose answer regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

impl Flashcard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Returned when neither prompt produced a parseable card.
    pub fn placeholder() -> Self {
        Self::new("What is the main topic?", "The content covers various topics.")
    }
}

enum CardState {
    ScanningForQuestion,
    CollectingAnswer(String),
    BlockComplete(Flashcard),
    /// Block failed the grammar; wait for the next blank line
    Rejected,
}

/// Parse blank-line separated `Q:`/`A:` blocks.
///
/// A block counts only when its first two non-empty lines carry the question
/// and answer markers. Other blocks are dropped silently.
pub fn parse_flashcards(text: &str) -> Vec<Flashcard> {
    let mut cards = Vec::new();
    let mut state = CardState::ScanningForQuestion;

    for line in text.lines() {
        let line = line.trim();

        if line.is_empty() {
            if let CardState::BlockComplete(card) = state {
                cards.push(card);
            }
            state = CardState::ScanningForQuestion;
            continue;
        }

        state = match state {
            CardState::ScanningForQuestion => match marked(line, QUESTION_MARKER) {
                Some(question) => CardState::CollectingAnswer(question),
                None => CardState::Rejected,
            },
            CardState::CollectingAnswer(question) => match marked(line, ANSWER_MARKER) {
                Some(answer) => CardState::BlockComplete(Flashcard { question, answer }),
                None => CardState::Rejected,
            },
            // trailing lines after a complete pair are ignored
            complete @ CardState::BlockComplete(_) => complete,
            CardState::Rejected => CardState::Rejected,
        };
    }

    if let CardState::BlockComplete(card) = state {
        cards.push(card);
    }

    cards
}

/// Text after `marker`, if the line starts with it and has content.
fn marked(line: &str, marker: &str) -> Option<String> {
    line.strip_prefix(marker)
        .map(str::trim)
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

/// Parse the simplified fallback format.
///
/// Accepts numbered or bulleted lines, `Question:`/`Answer:` spellings, and
/// a question and answer sharing one line.
pub fn parse_loose_flashcards(text: &str) -> Vec<Flashcard> {
    let mut cards = Vec::new();
    let mut pending: Option<String> = None;

    for line in text.lines() {
        let line = LIST_PREFIX.replace(line.trim(), "");
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = INLINE_PAIR.captures(line) {
            cards.push(Flashcard::new(caps[1].trim(), caps[2].trim()));
            pending = None;
        } else if let Some(caps) = LOOSE_QUESTION.captures(line) {
            pending = Some(caps[1].trim().to_string());
        } else if let Some(caps) = LOOSE_ANSWER.captures(line) {
            if let Some(question) = pending.take() {
                cards.push(Flashcard::new(question, caps[1].trim()));
            }
        }
    }

    cards
}

/// Generate up to `count` flashcards from document text.
pub fn generate_flashcards(
    client: &dyn Completion,
    text: &str,
    count: usize,
    focus: &Focus,
) -> Vec<Flashcard> {
    if count == 0 {
        return vec![];
    }

    let content = condense_for_generation(client, text, "flashcards");
    let request = CompletionRequest::new(flashcard_prompt(&content, count, focus), FLASHCARD_PARAMS);

    let reply = match client.complete_structured(&request) {
        Ok(reply) => reply,
        Err(err) => {
            log::warn!("flashcards outcome=error err={err}");
            return vec![Flashcard::new(
                format!("Error generating flashcards: {err}"),
                "Please try again.",
            )];
        }
    };

    let mut cards = parse_flashcards(&reply);
    if cards.is_empty() {
        log::info!("flashcards outcome=unparsed, using simplified prompt");
        cards = fallback_flashcards(client, &content, count);
    }

    cards.truncate(count);
    cards
}

fn fallback_flashcards(client: &dyn Completion, content: &str, count: usize) -> Vec<Flashcard> {
    let request = CompletionRequest::new(flashcard_fallback_prompt(content, count), FALLBACK_PARAMS);

    match client.complete_structured(&request) {
        Ok(reply) => {
            let cards = parse_loose_flashcards(&reply);
            if cards.is_empty() {
                log::warn!("flashcards fallback outcome=unparsed");
                vec![Flashcard::placeholder()]
            } else {
                cards
            }
        }
        Err(err) => {
            log::warn!("flashcards fallback outcome=error err={err}");
            vec![Flashcard::placeholder()]
        }
    }
}
