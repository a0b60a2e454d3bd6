use crate::config::ConfigError;
use crate::document::ExtractionError;
use crate::eid::Eid;
use crate::llm::CompletionError;
use crate::semantic::{EmbeddingError, RetrievalError};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("history entry not found: {0}")]
    NotFound(Eid),

    #[error("expected {expected} answers, got {got}")]
    AnswerCount { expected: usize, got: usize },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("completion client: {0}")]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0:?}")]
    IO(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
