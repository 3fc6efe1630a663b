use std::cmp::Ordering;

use thiserror::Error;

use crate::models::Candidate;

/// Error types for similarity retrieval
#[derive(Debug, Error, PartialEq)]
pub enum IndexError {
    #[error("Similarity matrix is not loaded")]
    IndexUnavailable,
    #[error("Item index {index} out of range for {size} items")]
    IndexOutOfRange { index: usize, size: usize },
}

/// Error raised when matrix rows do not form a valid square matrix
#[derive(Debug, Error, PartialEq)]
pub enum MatrixError {
    #[error("row {row} has {len} columns, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("non-finite score at ({row}, {column})")]
    NonFinite { row: usize, column: usize },
}

/// Dense N×N similarity scores, stored row-major
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    dim: usize,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    /// Builds a matrix from rows, rejecting ragged rows and NaN/infinite scores
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        let dim = rows.len();
        let mut scores = Vec::with_capacity(dim * dim);

        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != dim {
                return Err(MatrixError::NotSquare {
                    row,
                    len: values.len(),
                    expected: dim,
                });
            }
            if let Some(column) = values.iter().position(|score| !score.is_finite()) {
                return Err(MatrixError::NonFinite { row, column });
            }
            scores.extend(values);
        }

        Ok(Self { dim, scores })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.scores[index * self.dim..(index + 1) * self.dim]
    }
}

/// Nearest-neighbor retrieval over a similarity matrix
///
/// An index without a matrix is a valid state: the service starts degraded and
/// every retrieval reports [`IndexError::IndexUnavailable`].
#[derive(Debug, Clone, Default)]
pub struct SimilarityIndex {
    matrix: Option<SimilarityMatrix>,
}

impl SimilarityIndex {
    pub fn new(matrix: SimilarityMatrix) -> Self {
        Self {
            matrix: Some(matrix),
        }
    }

    pub fn unavailable() -> Self {
        Self { matrix: None }
    }

    pub fn is_loaded(&self) -> bool {
        self.matrix.is_some()
    }

    pub fn size(&self) -> Option<usize> {
        self.matrix.as_ref().map(SimilarityMatrix::dim)
    }

    /// Returns up to `k` candidates most similar to `index`, never `index` itself
    ///
    /// Candidates are ordered by descending score; equal scores are ordered by
    /// ascending item index. Selection is linear in the row length, followed by a
    /// sort of the `k` survivors.
    pub fn top_k(&self, index: usize, k: usize) -> Result<Vec<Candidate>, IndexError> {
        let matrix = self.matrix.as_ref().ok_or(IndexError::IndexUnavailable)?;

        if index >= matrix.dim() {
            return Err(IndexError::IndexOutOfRange {
                index,
                size: matrix.dim(),
            });
        }

        if k == 0 {
            return Ok(Vec::new());
        }

        let mut candidates: Vec<Candidate> = matrix
            .row(index)
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .map(|(other, &score)| Candidate {
                index: other,
                score,
            })
            .collect();

        if k < candidates.len() {
            candidates.select_nth_unstable_by(k - 1, rank);
            candidates.truncate(k);
        }
        candidates.sort_unstable_by(rank);

        Ok(candidates)
    }
}

/// Higher score first, then lower index
///
/// Scores are finite (checked in [`SimilarityMatrix::from_rows`]), so
/// `partial_cmp` is total here and `0.0` and `-0.0` compare equal.
fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.index.cmp(&b.index))
}
