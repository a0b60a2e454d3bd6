//! Retrieval-augmented answers: direct, ELI5 and insight styles.

use serde::Serialize;

use crate::llm::prompts::answer_prompt;
use crate::llm::{AnswerStyle, Completion, CompletionRequest};
use crate::semantic::{RetrievalError, RetrievedPassage, Retriever};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    pub style: AnswerStyle,
    /// Passages the answer was grounded on, best first
    pub passages: Vec<RetrievedPassage>,
}

/// Retrieve the top `k` passages for `question` and ask the model.
///
/// Only retrieval problems are errors. A failed completion is reported in
/// the answer text.
pub fn answer_question(
    retriever: &Retriever,
    client: &dyn Completion,
    question: &str,
    style: AnswerStyle,
    k: usize,
) -> Result<Answer, RetrievalError> {
    let passages = retriever.retrieve(question, k)?;
    let context: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();

    let request = CompletionRequest::new(answer_prompt(style, &context, question), style.params());
    let answer = client.complete_or_report(&request);

    Ok(Answer {
        question: question.to_string(),
        answer,
        style,
        passages,
    })
}
