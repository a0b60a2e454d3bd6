//! Exact inner-product index over L2-normalized passage vectors.
//!
//! Built once per document and never updated in place: loading a new
//! document builds a fresh index and drops the old one. Vectors are
//! normalized at build time and queries at search time, so the inner
//! product ranks exactly like cosine similarity. A zero vector stays zero
//! and scores 0 against everything.

use std::cmp::Ordering;

/// One search hit: the passage position in build order and its similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub position: usize,
    pub score: f32,
}

/// Brute-force similarity index.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    /// Unit-length vectors, in passage order
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Dimension mismatch at position {position}: expected {expected}, got {got}")]
    DimensionMismatch {
        position: usize,
        expected: usize,
        got: usize,
    },

    #[error("Cannot build an index from zero vectors")]
    Empty,
}

impl SimilarityIndex {
    /// Build an index from vectors in passage order.
    ///
    /// All vectors must share the length of the first one.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let dimensions = vectors.first().map(Vec::len).ok_or(IndexError::Empty)?;

        let vectors = vectors
            .into_iter()
            .enumerate()
            .map(|(position, vector)| {
                if vector.len() != dimensions {
                    return Err(IndexError::DimensionMismatch {
                        position,
                        expected: dimensions,
                        got: vector.len(),
                    });
                }
                if l2_norm(&vector) < f32::EPSILON {
                    log::warn!("zero-norm passage vector position={position}, it will score 0");
                }
                Ok(normalize(vector))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            vectors,
            dimensions,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Return the `k` most similar passages, best first.
    ///
    /// `k` larger than the index returns every passage. Equal scores keep
    /// passage order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                position: 0,
                expected: self.dimensions,
                got: query.len(),
            });
        }

        if k == 0 {
            return Ok(vec![]);
        }

        let query = normalize(query.to_vec());

        let mut results: Vec<SearchResult> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| SearchResult {
                position,
                score: dot(&query, vector),
            })
            .collect();

        // stable sort: ties stay in passage order
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(k);

        Ok(results)
    }
}

/// Compute L2 norm of a vector.
fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale to unit length. (Near) zero and non-finite vectors come back as
/// all zeros.
fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = l2_norm(&v);
    if norm < f32::EPSILON || !norm.is_finite() {
        v.iter_mut().for_each(|x| *x = 0.0);
    } else {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> SimilarityIndex {
        SimilarityIndex::build(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.7, 0.7, 0.0],
            vec![0.0, 0.0, 5.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_build_normalizes() {
        let index = SimilarityIndex::build(vec![vec![3.0, 4.0]]).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.dimensions(), 2);

        let results = index.search(&[3.0, 4.0], 1).unwrap();
        assert!((results[0].score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_build_rejects_empty_and_bad_vectors() {
        assert!(matches!(
            SimilarityIndex::build(vec![]),
            Err(IndexError::Empty)
        ));
        assert!(matches!(
            SimilarityIndex::build(vec![vec![1.0, 0.0], vec![1.0]]),
            Err(IndexError::DimensionMismatch { position: 1, .. })
        ));
    }

    #[test]
    fn test_zero_vector_kept_with_zero_score() {
        let index = SimilarityIndex::build(vec![vec![0.0, 0.0], vec![1.0, 0.0]]).unwrap();
        assert_eq!(index.len(), 2);

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].position, 1);
        assert_eq!(results[1], SearchResult { position: 0, score: 0.0 });
    }

    #[test]
    fn test_search_orders_by_descending_score() {
        let index = sample_index();
        let results = index.search(&[1.0, 0.1, 0.0], 10).unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].position, 0);
        assert_eq!(results[1].position, 2);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_query_scale_does_not_change_ranking() {
        let index = sample_index();
        let small = index.search(&[0.1, 0.2, 0.0], 4).unwrap();
        let large = index.search(&[10.0, 20.0, 0.0], 4).unwrap();

        let positions = |r: &[SearchResult]| r.iter().map(|h| h.position).collect::<Vec<_>>();
        assert_eq!(positions(&small), positions(&large));
        for (a, b) in small.iter().zip(large.iter()) {
            assert!((a.score - b.score).abs() < 1e-5);
        }
    }

    #[test]
    fn test_k_zero_and_k_too_large() {
        let index = sample_index();
        assert!(index.search(&[1.0, 0.0, 0.0], 0).unwrap().is_empty());
        assert_eq!(index.search(&[1.0, 0.0, 0.0], 100).unwrap().len(), 4);
    }

    #[test]
    fn test_ties_keep_passage_order() {
        let index = SimilarityIndex::build(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.0, 2.0],
            vec![1.0, 0.0],
        ])
        .unwrap();

        let results = index.search(&[1.0, 0.0], 4).unwrap();
        let positions: Vec<usize> = results.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_search_rejects_bad_query() {
        let index = sample_index();
        assert!(matches!(
            index.search(&[1.0, 0.0], 1),
            Err(IndexError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_query_scores_everything_zero() {
        let index = sample_index();
        let results = index.search(&[0.0, 0.0, 0.0], 4).unwrap();

        let positions: Vec<usize> = results.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
        assert!(results.iter().all(|r| r.score == 0.0));
    }
}
