//! Core types shared by the similarity operations.
//!
//! `EmbeddingMatrix` enforces the single-dimension invariant at construction
//! time, so the batch operations only ever see well-formed input.

use std::borrow::Cow;

use crate::error::{VectorOpsError, VectorOpsResult};

/// Common embedding width, used as the reference size in tests and benches.
pub const VECTOR_DIMENSION_384: usize = 384;

/// Number of bytes per f32 element.
pub const BYTES_PER_F32: usize = 4;

/// N embeddings of identical dimension stored row-major.
///
/// Row `i` occupies `data[i * dimension..(i + 1) * dimension]`. The matrix
/// either borrows caller memory or owns a buffer assembled from rows.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix<'a> {
    data: Cow<'a, [f32]>,
    dimension: usize,
    rows: usize,
}

impl<'a> EmbeddingMatrix<'a> {
    /// Wraps a contiguous row-major buffer without copying.
    ///
    /// # Errors
    /// Returns `InvalidDimension` if the buffer length is not a whole number
    /// of rows, or if `dimension` is zero while data is present.
    pub fn from_slice(data: &'a [f32], dimension: usize) -> VectorOpsResult<Self> {
        let rows = Self::row_count(data.len(), dimension)?;
        Ok(Self {
            data: Cow::Borrowed(data),
            dimension,
            rows,
        })
    }

    /// Builds an owned matrix from individual rows.
    ///
    /// # Errors
    /// Returns `RaggedMatrix` for the first row whose length differs from the
    /// first row. Nothing is truncated or padded. Empty rows are rejected with
    /// `InvalidDimension`, as [`Self::from_slice`] rejects a zero dimension
    /// for a non-empty matrix.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> VectorOpsResult<EmbeddingMatrix<'static>> {
        let dimension = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if dimension == 0 && !rows.is_empty() {
            return Err(VectorOpsError::InvalidDimension {
                expected: 0,
                actual: 0,
            });
        }
        let mut data = Vec::with_capacity(rows.len() * dimension);

        for (row, values) in rows.iter().enumerate() {
            let values = values.as_ref();
            if values.len() != dimension {
                return Err(VectorOpsError::RaggedMatrix {
                    row,
                    expected: dimension,
                    actual: values.len(),
                });
            }
            data.extend_from_slice(values);
        }

        if rows.len() > u32::MAX as usize {
            return Err(VectorOpsError::TooManyRows { rows: rows.len() });
        }

        Ok(EmbeddingMatrix {
            data: Cow::Owned(data),
            dimension,
            rows: rows.len(),
        })
    }

    fn row_count(len: usize, dimension: usize) -> VectorOpsResult<usize> {
        if dimension == 0 {
            if len == 0 {
                return Ok(0);
            }
            return Err(VectorOpsError::InvalidDimension {
                expected: 0,
                actual: len,
            });
        }
        if len % dimension != 0 {
            return Err(VectorOpsError::InvalidDimension {
                expected: dimension,
                actual: len % dimension,
            });
        }
        let rows = len / dimension;
        if rows > u32::MAX as usize {
            return Err(VectorOpsError::TooManyRows { rows });
        }
        Ok(rows)
    }

    /// Number of embeddings (N).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Dimension of every row (D).
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Returns row `index`, or `None` past the end.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    /// The full row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Iterates rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        (0..self.rows).filter_map(move |i| self.row(i))
    }
}

/// A similarity score paired with the row it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityResult {
    /// Row position in the source matrix
    pub index: u32,
    pub score: f32,
}

/// Output of a threshold-filtered batch, in ascending index order.
///
/// `scores[i]` belongs to row `indices[i]`. Results are never sorted by score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdMatches {
    pub scores: Vec<f32>,
    pub indices: Vec<u32>,
}

impl ThresholdMatches {
    /// Number of retained rows.
    #[must_use]
    pub fn count(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SimilarityResult> + '_ {
        self.indices
            .iter()
            .zip(self.scores.iter())
            .map(|(&index, &score)| SimilarityResult { index, score })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_shapes() {
        let data = [1.0, 0.0, 0.0, 1.0, -1.0, 0.0];
        let matrix = EmbeddingMatrix::from_slice(&data, 2).unwrap();
        assert_eq!(matrix.rows(), 3);
        assert_eq!(matrix.dimension(), 2);
        assert_eq!(matrix.row(1), Some(&[0.0, 1.0][..]));
        assert_eq!(matrix.row(3), None);

        // Partial trailing row is rejected, not truncated
        let result = EmbeddingMatrix::from_slice(&data[..5], 2);
        assert!(matches!(
            result,
            Err(VectorOpsError::InvalidDimension { .. })
        ));

        // Zero dimension is only valid for an empty buffer
        assert!(EmbeddingMatrix::from_slice(&data, 0).is_err());
        let empty = EmbeddingMatrix::from_slice(&[], 0).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0, 5.0]];
        let result = EmbeddingMatrix::from_rows(&rows);
        assert!(matches!(
            result,
            Err(VectorOpsError::RaggedMatrix {
                row: 1,
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_from_rows_is_row_major() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let matrix = EmbeddingMatrix::from_rows(&rows).unwrap();
        assert_eq!(matrix.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        let collected: Vec<&[f32]> = matrix.iter_rows().collect();
        assert_eq!(collected, vec![&[1.0, 2.0][..], &[3.0, 4.0][..]]);

        let empty: Vec<Vec<f32>> = Vec::new();
        let matrix = EmbeddingMatrix::from_rows(&empty).unwrap();
        assert_eq!(matrix.rows(), 0);
        assert_eq!(matrix.dimension(), 0);
    }

    #[test]
    fn test_from_rows_rejects_empty_rows() {
        let rows: Vec<Vec<f32>> = vec![Vec::new(), Vec::new()];
        assert!(matches!(
            EmbeddingMatrix::from_rows(&rows),
            Err(VectorOpsError::InvalidDimension { .. })
        ));

        // A leading empty row makes every later row ragged as well
        let rows = vec![Vec::new(), vec![1.0f32]];
        assert!(EmbeddingMatrix::from_rows(&rows).is_err());
    }

    #[test]
    fn test_threshold_matches_iter() {
        let matches = ThresholdMatches {
            scores: vec![0.9, 0.7],
            indices: vec![2, 5],
        };
        assert_eq!(matches.count(), 2);
        let results: Vec<SimilarityResult> = matches.iter().collect();
        assert_eq!(results[0], SimilarityResult { index: 2, score: 0.9 });
        assert_eq!(results[1], SimilarityResult { index: 5, score: 0.7 });
        assert!(ThresholdMatches::default().is_empty());
    }
}
