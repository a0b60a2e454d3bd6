//! Retrieval side of the pipeline.
//!
//! # Architecture
//!
//! - `chunker`: Splits document text into passages
//! - `embeddings`: Embedder trait and the fastembed-backed model
//! - `index`: Exact inner-product index over normalized vectors
//! - `retriever`: Embeds queries and maps hits back to passages

pub mod chunker;
pub mod embeddings;
mod index;
mod retriever;

pub use chunker::split_into_passages;
pub use embeddings::{Embedder, EmbeddingError, EmbeddingModel};
pub use retriever::{RetrievalError, RetrievedPassage, Retriever};

/// Default embedding model name (384-dimensional)
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";
