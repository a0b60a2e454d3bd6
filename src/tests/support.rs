//! In-crate fakes for the model-facing traits.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::app::Session;
use crate::document::DocumentExtractor;
use crate::llm::{Completion, CompletionError, CompletionRequest, ErrorKind};
use crate::semantic::{Embedder, EmbeddingError};

/// Completion backend that replays canned replies and records every request.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    always_fail: bool,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(vec![]),
            always_fail: false,
        }
    }

    /// Every call fails with a rate-limit error.
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::new(vec![])
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }
}

impl Completion for ScriptedCompletion {
    fn complete_raw(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());

        if self.always_fail {
            return Err(CompletionError::new(ErrorKind::RateLimit, "scripted failure"));
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::new(ErrorKind::Transport, "no scripted reply left")))
    }
}

const VOCABULARY: [&str; 6] = ["cats", "dogs", "mammals", "are", "what", "too"];

/// Bag-of-words embedder over a tiny vocabulary. The last dimension counts
/// words outside the vocabulary.
#[derive(Default)]
pub struct KeywordEmbedder {
    broken: AtomicBool,
}

impl KeywordEmbedder {
    /// Make every following call fail.
    pub fn break_model(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; VOCABULARY.len() + 1];
        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            match VOCABULARY.iter().position(|known| *known == word) {
                Some(idx) => vector[idx] += 1.0,
                None => vector[VOCABULARY.len()] += 1.0,
            }
        }
        vector
    }
}

impl Embedder for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword-test"
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len() + 1
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(EmbeddingError::EmbeddingFailed("model unavailable".to_string()));
        }
        Ok(texts.iter().map(|text| Self::vectorize(text)).collect())
    }
}

pub const CATS_AND_DOGS: &str = "Cats are mammals.\n\nDogs are mammals too.";

/// Session over the fakes, with the default retrieval depth.
pub fn session_with(
    completion: Arc<ScriptedCompletion>,
    embedder: Arc<KeywordEmbedder>,
) -> Session {
    Session::new(completion, embedder, Box::new(DocumentExtractor), 2)
}
