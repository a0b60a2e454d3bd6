//! Prompt templates and sampling parameters, one set per feature.
//!
//! Every builder is a pure function of its inputs. Context passages are
//! joined with newlines in the order they were retrieved.

use std::fmt;

/// Sampling parameters for one completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Creative framing gets more randomness; extraction tasks stay near-deterministic.
pub const DIRECT_ANSWER_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.7,
    max_tokens: 1024,
};
pub const ELI5_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.7,
    max_tokens: 1024,
};
pub const INSIGHTS_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.5,
    max_tokens: 1024,
};
pub const SUMMARY_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.7,
    max_tokens: 1024,
};
pub const CONDENSE_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.3,
    max_tokens: 512,
};
pub const FLASHCARD_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.3,
    max_tokens: 1024,
};
pub const MCQ_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.3,
    max_tokens: 2048,
};
pub const FALLBACK_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.3,
    max_tokens: 1024,
};

/// Characters of content handed to the simplified fallback prompts
pub const FALLBACK_CONTENT_CHARS: usize = 2000;

/// What part of the document a generation task should cover.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    EntireDocument,
    Concept(String),
}

impl Focus {
    /// Blank input and "entire pdf"/"entire document" mean the whole document.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "entire pdf" | "entire document" | "all" => Focus::EntireDocument,
            _ => Focus::Concept(trimmed.to_string()),
        }
    }

    pub fn concept(&self) -> Option<&str> {
        match self {
            Focus::EntireDocument => None,
            Focus::Concept(concept) => Some(concept),
        }
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Focus::EntireDocument => f.write_str("Entire document"),
            Focus::Concept(concept) => f.write_str(concept),
        }
    }
}

/// Framing of a retrieval-augmented answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStyle {
    #[default]
    Direct,
    Eli5,
    Insights,
}

impl AnswerStyle {
    pub fn params(self) -> GenerationParams {
        match self {
            AnswerStyle::Direct => DIRECT_ANSWER_PARAMS,
            AnswerStyle::Eli5 => ELI5_PARAMS,
            AnswerStyle::Insights => INSIGHTS_PARAMS,
        }
    }

    fn preamble(self) -> &'static str {
        match self {
            AnswerStyle::Direct => {
                "You are a helpful assistant. Use ONLY the context below to answer the question. \
                 If the answer is not in the context, say you don't know."
            }
            AnswerStyle::Eli5 => {
                "You are a helpful assistant who explains things in a way a 5-year-old can understand. \
                 Use ONLY the context below to answer the question. Avoid technical terms. \
                 Use simple words, short sentences, and child-friendly examples.\n\
                 Explain the answer in a very simple and creative way, like you're talking to a 5-year-old. \
                 If the answer is not in the context, say you don't know."
            }
            AnswerStyle::Insights => {
                "You are an expert assistant. Use the context below to answer the question thoughtfully. \
                 Provide deep insights, real-world applications, and practical examples that go beyond \
                 the basic information in the context. Explain why this matters and how it applies in \
                 different scenarios. If the question can't be answered from the context, say so."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Serialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    fn instructions(self) -> &'static str {
        match self {
            Difficulty::Easy => {
                "Create basic, straightforward questions that test fundamental understanding. \
                 Use simple language and obvious answer choices."
            }
            Difficulty::Medium => {
                "Create moderately challenging questions that test comprehension and application. \
                 Include some analysis and reasoning."
            }
            Difficulty::Hard => {
                "Create advanced questions that test deep understanding, critical thinking, and \
                 complex concepts. Include synthesis and evaluation."
            }
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(label)
    }
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

pub fn join_context(passages: &[String]) -> String {
    passages.join("\n")
}

pub fn answer_prompt(style: AnswerStyle, context: &[String], question: &str) -> String {
    format!(
        "{}\n\nContext:\n{}\n\nQuestion: {}\nAnswer:",
        style.preamble(),
        join_context(context),
        question
    )
}

/// Compression request used before flashcard/MCQ generation on long input.
pub fn condense_prompt(text: &str, purpose: &str) -> String {
    format!("Summarize the following content in 500 words to create {purpose} from:\n\n{text}")
}

pub fn summary_prompt(text: &str, words: usize, focus: &Focus) -> String {
    let focus_clause = match focus {
        Focus::EntireDocument => "Summarize the entire content comprehensively.".to_string(),
        Focus::Concept(concept) => {
            format!("Focus exclusively on: {concept}. Omit unrelated information.")
        }
    };
    format!(
        "Create a concise summary of approximately {words} words.\n\
         {focus_clause}\n\
         Content to summarize:\n\
         {text}"
    )
}

pub fn window_summary_prompt(window: &str, words: usize) -> String {
    format!("Create a brief summary of about {words} words:\n{window}")
}

pub fn combine_summaries_prompt(summaries: &[String], words: usize, focus: &Focus) -> String {
    let focus_line = focus.concept().unwrap_or("all key aspects");
    format!(
        "Combine these into one cohesive summary of {words} words:\n{}\nFocus: {focus_line}",
        summaries.join(" ")
    )
}

pub fn flashcard_prompt(text: &str, count: usize, focus: &Focus) -> String {
    let focus_clause = match focus {
        Focus::EntireDocument => {
            "Use the contents in the entire document to generate flashcards.".to_string()
        }
        Focus::Concept(concept) => format!(
            "Focus deeply ONLY on: **{concept}** (ignore unrelated content). \
             All cards must be about this specific concept."
        ),
    };
    format!(
        "Create {count} flashcards from the following content.\n\
         {focus_clause}\n\
         Each question must be exactly one sentence.\n\
         Each answer must be exactly one sentence.\n\
         Format the output so that each flashcard is on two separate lines:\n\
         First line: Q: <question sentence>\n\
         Second line: A: <answer sentence>\n\n\
         Separate each flashcard by one empty line.\n\n\
         Content:\n\
         {text}\n\n\
         Flashcards:"
    )
}

pub fn flashcard_fallback_prompt(text: &str, count: usize) -> String {
    format!(
        "From this content, create {count} simple flashcards.\n\
         For each concept, create a question and answer pair.\n\
         Format: \"1. Q: [question] A: [answer]\"\n\n\
         Content: {}\n\n\
         Simple flashcards:",
        truncate_chars(text, FALLBACK_CONTENT_CHARS)
    )
}

pub fn mcq_prompt(text: &str, count: usize, difficulty: Difficulty, focus: &Focus) -> String {
    let focus_clause = match focus {
        Focus::EntireDocument => {
            "Use the contents in the entire document to generate MCQs based on the difficulty level."
                .to_string()
        }
        Focus::Concept(concept) => format!(
            "Focus deeply ONLY on: **{concept}** (ignore unrelated content). \
             All questions must be about this specific concept."
        ),
    };
    format!(
        "Create {count} multiple choice questions from the following content.\n\
         Difficulty Level: {difficulty}\n\
         {}\n\
         Content Scope:\n\
         {focus_clause}\n\n\
         Each question should have exactly 4 options (A, B, C, D) with only one correct answer.\n\
         Format each MCQ as:\n\
         Q: [question]\n\
         A) [option A]\n\
         B) [option B]\n\
         C) [option C]\n\
         D) [option D]\n\
         Correct Answer: [A/B/C/D]\n\n\
         Content:\n\
         {text}\n\n\
         MCQs:",
        difficulty.instructions()
    )
}

pub fn mcq_fallback_prompt(text: &str, count: usize) -> String {
    format!(
        "From this content, create {count} simple multiple choice questions.\n\
         Each question should have 4 options (A, B, C, D) with only one correct answer.\n\
         Format: \"Q: [question] A) [option] B) [option] C) [option] D) [option] Correct Answer: [A/B/C/D]\"\n\n\
         Content: {}\n\n\
         Simple MCQs:",
        truncate_chars(text, FALLBACK_CONTENT_CHARS)
    )
}
