//! Multiple-choice question generation and parsing.
//!
//! Grammar of one question block:
//!
//! ```text
//! Q: <question>
//! A) <option>        (A. also accepted)
//! B) <option>
//! C) <option>
//! D) <option>
//! Correct Answer: <A|B|C|D>
//! ```
//!
//! Blocks start at a question marker at the beginning of a line. A block is
//! emitted only when it has the question, exactly one option for each letter
//! and a valid correct answer; anything less is dropped.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::llm::prompts::{mcq_fallback_prompt, mcq_prompt, FALLBACK_PARAMS, MCQ_PARAMS};
use crate::llm::{Completion, CompletionRequest, Difficulty, Focus};
use crate::study::condense::condense_for_generation;

static QUESTION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:\d+\s*[.)]\s*)?(?:\*\*)?(?:q|question)\s*\d*\s*[:.)](?:\*\*)?\s*(.*)$")
        .expect("valid question marker regex")
});

static OPTION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\(?([A-D])[).]\s*(.*)$").expect("valid option regex"));

static CORRECT_ANSWER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*\**\s*correct\s+answer\s*\**\s*:\s*\**\s*\(?([a-d])?\b").expect("valid answer regex")
});

static INLINE_OPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(\(?([A-D])[).])").expect("valid inline option regex"));

static INLINE_CORRECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(correct\s+answer\s*:)").expect("valid inline answer regex"));

static INLINE_QUESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(Q:)\s").expect("valid inline question regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
}

impl Choice {
    pub const ALL: [Choice; 4] = [Choice::A, Choice::B, Choice::C, Choice::D];

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Some(Choice::A),
            'B' => Some(Choice::B),
            'C' => Some(Choice::C),
            'D' => Some(Choice::D),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::C => "C",
            Choice::D => "D",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mcq {
    pub question: String,
    /// Option texts in A, B, C, D order, without letter prefixes
    pub options: Vec<String>,
    pub correct_answer: Choice,
}

impl Mcq {
    /// Returned when neither prompt produced a parseable question.
    pub fn placeholder() -> Self {
        Self {
            question: "What is the main topic?".to_string(),
            options: vec![
                "Various topics".to_string(),
                "One topic".to_string(),
                "No topic".to_string(),
                "Multiple topics".to_string(),
            ],
            correct_answer: Choice::A,
        }
    }

    fn error_item(detail: &str) -> Self {
        Self {
            question: format!("Error generating MCQs: {detail}"),
            options: vec!["Try again".to_string(); 4],
            correct_answer: Choice::A,
        }
    }

    pub fn correct_option(&self) -> &str {
        self.options
            .get(self.correct_answer.index())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Options labelled with their letters, e.g. `A) Paris`.
    pub fn labelled_options(&self) -> impl Iterator<Item = String> + '_ {
        Choice::ALL
            .iter()
            .zip(self.options.iter())
            .map(|(choice, option)| format!("{choice}) {option}"))
    }
}

/// Fields gathered for the block being scanned.
#[derive(Default)]
struct McqDraft {
    question: Option<String>,
    options: Vec<(Choice, String)>,
    correct_answer: Option<Choice>,
}

impl McqDraft {
    fn starting_with(question: &str) -> Self {
        let question = question.trim();
        Self {
            question: (!question.is_empty()).then(|| question.to_string()),
            ..Default::default()
        }
    }

    fn has_all_fields(&self) -> bool {
        self.question.is_some()
            && self.correct_answer.is_some()
            && self.options.len() == 4
            && Choice::ALL
                .iter()
                .all(|c| self.options.iter().filter(|(letter, _)| letter == c).count() == 1)
    }

    fn finish(mut self) -> Option<Mcq> {
        if !self.has_all_fields() {
            return None;
        }
        self.options.sort_by_key(|(choice, _)| choice.index());
        Some(Mcq {
            question: self.question?,
            options: self.options.into_iter().map(|(_, text)| text).collect(),
            correct_answer: self.correct_answer?,
        })
    }

    fn accept_line(&mut self, line: &str) {
        if let Some(caps) = OPTION_LINE.captures(line) {
            if let Some(choice) = caps[1].chars().next().and_then(Choice::from_letter) {
                self.options.push((choice, caps[2].trim().to_string()));
            }
        } else if let Some(caps) = CORRECT_ANSWER_LINE.captures(line) {
            self.correct_answer = caps
                .get(1)
                .and_then(|m| m.as_str().chars().next())
                .and_then(Choice::from_letter);
        } else if self.question.is_none() {
            self.question = Some(line.to_string());
        }
    }
}

enum McqState {
    ScanningForQuestion,
    CollectingOptions(McqDraft),
    BlockComplete(McqDraft),
}

impl McqState {
    fn from_draft(draft: McqDraft) -> Self {
        if draft.has_all_fields() {
            McqState::BlockComplete(draft)
        } else {
            McqState::CollectingOptions(draft)
        }
    }

    /// Close the current block, keeping it only if complete.
    fn close(self, out: &mut Vec<Mcq>) {
        if let McqState::BlockComplete(draft) = self {
            out.extend(draft.finish());
        }
    }
}

/// Parse question blocks into MCQs, dropping incomplete ones.
pub fn parse_mcqs(text: &str) -> Vec<Mcq> {
    let mut mcqs = Vec::new();
    let mut state = McqState::ScanningForQuestion;

    for line in text.lines() {
        if let Some(caps) = QUESTION_MARKER.captures(line) {
            state.close(&mut mcqs);
            state = McqState::from_draft(McqDraft::starting_with(&caps[1]));
            continue;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        state = match state {
            McqState::ScanningForQuestion => McqState::ScanningForQuestion,
            McqState::CollectingOptions(mut draft) | McqState::BlockComplete(mut draft) => {
                draft.accept_line(line);
                McqState::from_draft(draft)
            }
        };
    }

    state.close(&mut mcqs);
    mcqs
}

/// Break `A) .. B) .. C) .. D) ..` onto separate lines. Markers only count
/// in A to D order, so a letter inside option text ("Vitamin A.") stays put.
fn split_inline_options(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 4);
    let mut expected = Choice::ALL.iter().peekable();
    let mut last = 0;

    for caps in INLINE_OPTION.captures_iter(line) {
        let (Some(whole), Some(marker), Some(letter)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let ends_word = line[whole.end()..].chars().next().map_or(true, char::is_whitespace);
        let in_order = expected.peek().is_some_and(|next| next.as_str() == letter.as_str());
        if !(ends_word && in_order) {
            continue;
        }

        expected.next();
        out.push_str(&line[last..whole.start()]);
        out.push('\n');
        out.push_str(marker.as_str());
        last = marker.end();
    }

    out.push_str(&line[last..]);
    out
}

/// Parse the single-line fallback format by breaking each inline marker onto
/// its own line first.
pub fn parse_loose_mcqs(text: &str) -> Vec<Mcq> {
    let text = INLINE_QUESTION.replace_all(text, "\n$1 ");
    let text = text.lines().map(split_inline_options).collect::<Vec<_>>().join("\n");
    let text = INLINE_CORRECT.replace_all(&text, "\n$1");
    parse_mcqs(&text)
}

/// Generate up to `count` MCQs from document text.
pub fn generate_mcqs(
    client: &dyn Completion,
    text: &str,
    count: usize,
    difficulty: Difficulty,
    focus: &Focus,
) -> Vec<Mcq> {
    if count == 0 {
        return vec![];
    }

    let content = condense_for_generation(client, text, "MCQs");
    let request = CompletionRequest::new(mcq_prompt(&content, count, difficulty, focus), MCQ_PARAMS);

    let reply = match client.complete_structured(&request) {
        Ok(reply) => reply,
        Err(err) => {
            log::warn!("mcq outcome=error err={err}");
            return vec![Mcq::error_item(&err.to_string())];
        }
    };

    let mut mcqs = parse_mcqs(&reply);
    log::debug!("mcq parsed count={}", mcqs.len());
    if mcqs.is_empty() {
        log::info!("mcq outcome=unparsed, using simplified prompt");
        mcqs = fallback_mcqs(client, &content, count);
    }

    mcqs.truncate(count);
    mcqs
}

fn fallback_mcqs(client: &dyn Completion, content: &str, count: usize) -> Vec<Mcq> {
    let request = CompletionRequest::new(mcq_fallback_prompt(content, count), FALLBACK_PARAMS);

    match client.complete_structured(&request) {
        Ok(reply) => {
            let mcqs = parse_loose_mcqs(&reply);
            if mcqs.is_empty() {
                log::warn!("mcq fallback outcome=unparsed");
                vec![Mcq::placeholder()]
            } else {
                mcqs
            }
        }
        Err(err) => {
            log::warn!("mcq fallback outcome=error err={err}");
            vec![Mcq::placeholder()]
        }
    }
}

/// Count correct answers; unanswered questions count as wrong.
pub fn score(answers: &[Option<Choice>], mcqs: &[Mcq]) -> (usize, usize) {
    let correct = mcqs
        .iter()
        .zip(answers.iter())
        .filter(|(mcq, answer)| **answer == Some(mcq.correct_answer))
        .count();

    (correct, mcqs.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "Q: What is the capital of France?\n\
                               A) Berlin\n\
                               B) Madrid\n\
                               C) Paris\n\
                               D) Rome\n\
                               Correct Answer: C";

    #[test]
    fn test_well_formed_block() {
        let mcqs = parse_mcqs(WELL_FORMED);
        assert_eq!(mcqs.len(), 1);

        let mcq = &mcqs[0];
        assert_eq!(mcq.question, "What is the capital of France?");
        assert_eq!(mcq.options, vec!["Berlin", "Madrid", "Paris", "Rome"]);
        assert_eq!(mcq.correct_answer.to_string(), "C");
        assert_eq!(mcq.correct_option(), "Paris");
    }

    #[test]
    fn test_missing_option_drops_block() {
        let text = "Q: Incomplete?\nA) one\nB) two\nC) three\nCorrect Answer: A\n\n\
                    Q: Complete?\nA. one\nB. two\nC. three\nD. four\nCorrect Answer: D";
        let mcqs = parse_mcqs(text);

        assert_eq!(mcqs.len(), 1);
        assert_eq!(mcqs[0].question, "Complete?");
        assert_eq!(mcqs[0].correct_answer, Choice::D);
    }

    #[test]
    fn test_missing_or_invalid_correct_answer_drops_block() {
        let missing = "Q: No answer?\nA) a\nB) b\nC) c\nD) d";
        assert!(parse_mcqs(missing).is_empty());

        let invalid = "Q: Bad answer?\nA) a\nB) b\nC) c\nD) d\nCorrect Answer: E";
        assert!(parse_mcqs(invalid).is_empty());
    }

    #[test]
    fn test_extra_option_rejects_block() {
        let text = "Q: Too many?\nA) a\nB) b\nC) c\nD) d\nA) again\nCorrect Answer: B";
        assert!(parse_mcqs(text).is_empty());
    }

    #[test]
    fn test_marker_variants_and_case() {
        let text = "Here are the questions:\n\
                    1. q: Lowercase marker?\nA) w\nB) x\nC) y\nD) z\ncorrect answer: b\n\
                    Question 2: Numbered?\nA) w\nB) x\nC) y\nD) z\n**Correct Answer:** (A)\n\
                    Q. Dotted?\nD) z\nC) y\nB) x\nA) w\nCorrect Answer: C) y";
        let mcqs = parse_mcqs(text);

        assert_eq!(mcqs.len(), 3);
        assert_eq!(mcqs[0].question, "Lowercase marker?");
        assert_eq!(mcqs[0].correct_answer, Choice::B);
        assert_eq!(mcqs[1].question, "Numbered?");
        assert_eq!(mcqs[1].correct_answer, Choice::A);
        assert_eq!(mcqs[2].options, vec!["w", "x", "y", "z"]);
        assert_eq!(mcqs[2].correct_answer, Choice::C);
    }

    #[test]
    fn test_question_on_following_line() {
        let text = "Q:\nWhich planet is red?\nA) Mars\nB) Venus\nC) Earth\nD) Jupiter\nCorrect Answer: A";
        let mcqs = parse_mcqs(text);
        assert_eq!(mcqs.len(), 1);
        assert_eq!(mcqs[0].question, "Which planet is red?");
    }

    #[test]
    fn test_words_starting_with_q_do_not_split_blocks() {
        let text = "Q: Which is a fruit?\nQuince is mentioned here.\nA) Quince\nB) Rock\nC) Iron\nD) Salt\nCorrect Answer: A";
        let mcqs = parse_mcqs(text);
        assert_eq!(mcqs.len(), 1);
        assert_eq!(mcqs[0].question, "Which is a fruit?");
    }

    #[test]
    fn test_loose_single_line_format() {
        let text = "Q: Largest ocean? A) Atlantic B) Pacific C) Indian D) Arctic Correct Answer: B \
                    Q: Smallest prime? A) 1 B) 2 C) 3 D) 5 Correct Answer: B";
        let mcqs = parse_loose_mcqs(text);

        assert_eq!(mcqs.len(), 2);
        assert_eq!(mcqs[0].question, "Largest ocean?");
        assert_eq!(mcqs[0].options, vec!["Atlantic", "Pacific", "Indian", "Arctic"]);
        assert_eq!(mcqs[1].correct_option(), "2");
    }

    #[test]
    fn test_loose_option_text_with_letters() {
        let text = "Q: Which vitamin comes from sunlight? A) Vitamin A. B) Vitamin D C) Vitamin C. \
                    D) Vitamin B12 Correct Answer: B";
        let mcqs = parse_loose_mcqs(text);

        assert_eq!(mcqs.len(), 1);
        assert_eq!(
            mcqs[0].options,
            vec!["Vitamin A.", "Vitamin D", "Vitamin C.", "Vitamin B12"]
        );
        assert_eq!(mcqs[0].correct_answer, Choice::B);
    }

    #[test]
    fn test_split_inline_options_needs_order() {
        assert_eq!(
            split_inline_options("Q: Pick one? A) Plan A. B) Plan B."),
            "Q: Pick one?\nA) Plan A.\nB) Plan B."
        );
        assert_eq!(
            split_inline_options("Q: x? A) a B) b C) c D) d"),
            "Q: x?\nA) a\nB) b\nC) c\nD) d"
        );
    }

    #[test]
    fn test_score() {
        let mcqs = parse_mcqs(&format!("{WELL_FORMED}\n\n{WELL_FORMED}\n\n{WELL_FORMED}"));
        assert_eq!(mcqs.len(), 3);

        let answers = vec![Some(Choice::C), Some(Choice::A), None];
        assert_eq!(score(&answers, &mcqs), (1, 3));
        assert_eq!(score(&[], &mcqs), (0, 3));
        assert_eq!(score(&[], &[]), (0, 0));
    }

    #[test]
    fn test_labelled_options() {
        let labelled: Vec<String> = Mcq::placeholder().labelled_options().collect();
        assert_eq!(labelled[0], "A) Various topics");
        assert_eq!(labelled[3], "D) Multiple topics");
    }
}
