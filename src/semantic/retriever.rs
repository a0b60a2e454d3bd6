//! Top-k passage retrieval.
//!
//! A [`Retriever`] owns one document's passages, their index and the
//! embedder that produced the vectors. All three are built together and
//! replaced together, so a query is always embedded by the same model that
//! embedded the passages.

use std::sync::Arc;

use crate::semantic::embeddings::{Embedder, EmbeddingError};
use crate::semantic::index::{IndexError, SimilarityIndex};

/// Errors that can occur during retrieval.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("No index: upload a document first")]
    NoIndex,

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}

/// A retrieved passage with its similarity score.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RetrievedPassage {
    pub position: usize,
    pub score: f32,
    pub text: String,
}

pub struct Retriever {
    passages: Vec<String>,
    index: SimilarityIndex,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    /// Embed every passage and build the index.
    ///
    /// Fails without side effects; the caller keeps whatever retriever it
    /// had before.
    pub fn build(passages: Vec<String>, embedder: Arc<dyn Embedder>) -> Result<Self, RetrievalError> {
        if passages.is_empty() {
            return Err(RetrievalError::NoIndex);
        }

        log::info!(
            "embedding passages count={} model={}",
            passages.len(),
            embedder.name()
        );

        let vectors = embedder.embed_batch(&passages)?;
        if vectors.len() != passages.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: passages.len(),
                got: vectors.len(),
            }
            .into());
        }

        let index = SimilarityIndex::build(vectors)?;
        log::debug!("index built dimensions={}", index.dimensions());

        Ok(Self {
            passages,
            index,
            embedder,
        })
    }

    pub fn passages(&self) -> &[String] {
        &self.passages
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    /// Fetch the `k` passages most similar to `query`, best first.
    ///
    /// `k` is clamped to the number of passages; `k == 0` returns nothing.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        if self.index.is_empty() {
            return Err(RetrievalError::NoIndex);
        }

        let k = k.min(self.index.len());
        if k == 0 {
            return Ok(vec![]);
        }

        let query_vector = self.embedder.embed(query)?;
        let hits = self.index.search(&query_vector, k)?;

        let passages = hits
            .into_iter()
            .filter_map(|hit| {
                self.passages.get(hit.position).map(|text| RetrievedPassage {
                    position: hit.position,
                    score: hit.score,
                    text: text.clone(),
                })
            })
            .collect::<Vec<_>>();

        log::debug!(
            "retrieved k={k} positions={:?}",
            passages.iter().map(|p| p.position).collect::<Vec<_>>()
        );

        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Maps "a"/"b"/"c" prefixes to fixed axes.
    struct AxisEmbedder;

    impl Embedder for AxisEmbedder {
        fn name(&self) -> &str {
            "axis"
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts
                .iter()
                .map(|t| match t.chars().next() {
                    Some('a') => vec![1.0, 0.0, 0.0],
                    Some('b') => vec![0.0, 1.0, 0.0],
                    _ => vec![0.0, 0.0, 1.0],
                })
                .collect())
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn name(&self) -> &str {
            "failing"
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::EmbeddingFailed("offline".to_string()))
        }
    }

    fn passages() -> Vec<String> {
        vec!["alpha".into(), "beta".into(), "charlie".into()]
    }

    #[test]
    fn test_retrieve_maps_back_to_passages() {
        let retriever = Retriever::build(passages(), Arc::new(AxisEmbedder)).unwrap();
        let results = retriever.retrieve("b question", 1).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].position, 1);
        assert_eq!(results[0].text, "beta");
    }

    #[test]
    fn test_k_clamped_and_zero() {
        let retriever = Retriever::build(passages(), Arc::new(AxisEmbedder)).unwrap();
        assert_eq!(retriever.retrieve("a", 50).unwrap().len(), 3);
        assert!(retriever.retrieve("a", 0).unwrap().is_empty());
    }

    #[test]
    fn test_build_without_passages_is_no_index() {
        let result = Retriever::build(vec![], Arc::new(AxisEmbedder));
        assert!(matches!(result, Err(RetrievalError::NoIndex)));
    }

    #[test]
    fn test_embedding_failure_aborts_build() {
        let result = Retriever::build(passages(), Arc::new(FailingEmbedder));
        assert!(matches!(result, Err(RetrievalError::Embedding(_))));
    }
}
