//! Batch cosine similarity and threshold filtering.
//!
//! Every score is produced by [`cosine_similarity`] on one row, so
//! `batch[i] == cosine_similarity(query, row(i))` holds exactly whether the
//! rows are scored sequentially or across the rayon pool.

use rayon::prelude::*;

use crate::error::{VectorOpsError, VectorOpsResult};
use crate::vector::math::cosine_similarity;
use crate::vector::types::{EmbeddingMatrix, ThresholdMatches};

/// Batches with at least this many rows are scored in parallel.
const PARALLEL_MIN_ROWS: usize = 2048;

/// Scores every row of a row-major buffer into `out`.
///
/// `embeddings.len()` must equal `out.len() * query.len()`; callers check
/// shapes first.
fn score_rows(query: &[f32], embeddings: &[f32], out: &mut [f32]) {
    let dimension = query.len();
    if dimension == 0 {
        out.fill(0.0);
        return;
    }

    if out.len() >= PARALLEL_MIN_ROWS {
        out.par_iter_mut()
            .zip(embeddings.par_chunks_exact(dimension))
            .for_each(|(score, row)| *score = cosine_similarity(query, row));
    } else {
        for (score, row) in out.iter_mut().zip(embeddings.chunks_exact(dimension)) {
            *score = cosine_similarity(query, row);
        }
    }
}

/// Stable single-pass filter: keeps entries with `score > threshold` in scan
/// order, writing them to the front of the output buffers. Returns the count.
fn filter_above(
    scores: &[f32],
    threshold: f32,
    out_scores: &mut [f32],
    out_indices: &mut [u32],
) -> usize {
    let mut count = 0;
    for (index, &score) in scores.iter().enumerate() {
        if score > threshold {
            out_scores[count] = score;
            out_indices[count] = index as u32;
            count += 1;
        }
    }
    count
}

fn check_dimension(query: &[f32], embeddings: &EmbeddingMatrix<'_>) -> VectorOpsResult<()> {
    if embeddings.is_empty() {
        return Ok(());
    }
    if query.len() != embeddings.dimension() {
        return Err(VectorOpsError::InvalidDimension {
            expected: embeddings.dimension(),
            actual: query.len(),
        });
    }
    Ok(())
}

/// Cosine similarity of `query` against every row.
///
/// # Errors
/// `InvalidDimension` if the query length differs from the row dimension.
pub fn try_batch_cosine_similarity(
    query: &[f32],
    embeddings: &EmbeddingMatrix<'_>,
) -> VectorOpsResult<Vec<f32>> {
    check_dimension(query, embeddings)?;
    if query.is_empty() || embeddings.is_empty() {
        return Ok(Vec::new());
    }

    let mut scores = vec![0.0; embeddings.rows()];
    score_rows(query, embeddings.as_slice(), &mut scores);
    Ok(scores)
}

/// Cosine similarity of `query` against every row.
///
/// A dimension mismatch yields an empty result, never partial output.
pub fn batch_cosine_similarity(query: &[f32], embeddings: &EmbeddingMatrix<'_>) -> Vec<f32> {
    try_batch_cosine_similarity(query, embeddings).unwrap_or_else(|e| {
        tracing::warn!("batch similarity rejected: {e}");
        Vec::new()
    })
}

/// Writes one score per row into `out`, returning the number written.
///
/// Writes nothing and returns 0 on a dimension mismatch or if `out` holds
/// fewer than `embeddings.rows()` elements.
pub fn batch_cosine_similarity_into(
    query: &[f32],
    embeddings: &EmbeddingMatrix<'_>,
    out: &mut [f32],
) -> usize {
    if check_dimension(query, embeddings).is_err() || out.len() < embeddings.rows() {
        return 0;
    }
    let rows = embeddings.rows();
    score_rows(query, embeddings.as_slice(), &mut out[..rows]);
    rows
}

/// Rows whose similarity to `query` is strictly above `threshold`.
///
/// Results keep ascending row order; they are not sorted by score.
///
/// # Errors
/// `InvalidDimension` if the query length differs from the row dimension.
pub fn try_batch_similarity_with_threshold(
    query: &[f32],
    embeddings: &EmbeddingMatrix<'_>,
    threshold: f32,
) -> VectorOpsResult<ThresholdMatches> {
    let scores = try_batch_cosine_similarity(query, embeddings)?;

    // Capacity N, trimmed to the retained count
    let mut out_scores = vec![0.0; scores.len()];
    let mut out_indices = vec![0u32; scores.len()];
    let count = filter_above(&scores, threshold, &mut out_scores, &mut out_indices);
    out_scores.truncate(count);
    out_indices.truncate(count);

    Ok(ThresholdMatches {
        scores: out_scores,
        indices: out_indices,
    })
}

/// Rows whose similarity to `query` is strictly above `threshold`.
///
/// Degenerate input (empty query, empty matrix, dimension mismatch) yields an
/// empty result.
pub fn batch_similarity_with_threshold(
    query: &[f32],
    embeddings: &EmbeddingMatrix<'_>,
    threshold: f32,
) -> ThresholdMatches {
    try_batch_similarity_with_threshold(query, embeddings, threshold).unwrap_or_else(|e| {
        tracing::warn!("threshold similarity rejected: {e}");
        ThresholdMatches::default()
    })
}

/// Buffer-writing form of [`batch_similarity_with_threshold`].
///
/// Both output buffers need capacity for `embeddings.rows()` entries. Only
/// the first `count` entries are meaningful; the rest are left as they were.
pub fn batch_similarity_with_threshold_into(
    query: &[f32],
    embeddings: &EmbeddingMatrix<'_>,
    threshold: f32,
    out_scores: &mut [f32],
    out_indices: &mut [u32],
) -> usize {
    let rows = embeddings.rows();
    if query.is_empty()
        || check_dimension(query, embeddings).is_err()
        || out_scores.len() < rows
        || out_indices.len() < rows
    {
        return 0;
    }

    let mut scores = vec![0.0; rows];
    score_rows(query, embeddings.as_slice(), &mut scores);
    filter_above(&scores, threshold, out_scores, out_indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[Vec<f32>]) -> EmbeddingMatrix<'static> {
        EmbeddingMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_batch_axis_scenario() {
        let query = vec![1.0, 0.0];
        let embeddings = matrix(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]]);

        let scores = batch_cosine_similarity(&query, &embeddings);
        assert_eq!(scores.len(), 3);
        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!(scores[1].abs() < 1e-6);
        assert!((scores[2] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_batch_matches_single_similarity_exactly() {
        let dim = 19;
        let rows: Vec<Vec<f32>> = (0..40)
            .map(|r| (0..dim).map(|c| ((r * 31 + c * 17) % 23) as f32 - 11.0).collect())
            .collect();
        let query: Vec<f32> = (0..dim).map(|c| (c as f32 * 0.3).cos()).collect();
        let embeddings = matrix(&rows);

        let scores = batch_cosine_similarity(&query, &embeddings);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(scores[i].to_bits(), cosine_similarity(&query, row).to_bits());
        }
    }

    #[test]
    fn test_parallel_path_matches_single_similarity() {
        let dim = 9;
        let rows = PARALLEL_MIN_ROWS + 3;
        let data: Vec<f32> = (0..rows * dim)
            .map(|i| ((i * 13) % 29) as f32 - 14.0)
            .collect();
        let query: Vec<f32> = (0..dim).map(|c| c as f32 + 0.5).collect();
        let embeddings = EmbeddingMatrix::from_slice(&data, dim).unwrap();

        let scores = batch_cosine_similarity(&query, &embeddings);
        assert_eq!(scores.len(), rows);
        for (i, row) in embeddings.iter_rows().enumerate() {
            assert_eq!(scores[i].to_bits(), cosine_similarity(&query, row).to_bits());
        }
    }

    #[test]
    fn test_dimension_mismatch_yields_empty() {
        let query = vec![1.0, 0.0, 0.0];
        let embeddings = matrix(&[vec![1.0, 0.0], vec![0.0, 1.0]]);

        assert!(batch_cosine_similarity(&query, &embeddings).is_empty());
        assert!(matches!(
            try_batch_cosine_similarity(&query, &embeddings),
            Err(VectorOpsError::InvalidDimension {
                expected: 2,
                actual: 3
            })
        ));
        assert_eq!(
            batch_similarity_with_threshold(&query, &embeddings, 0.0).count(),
            0
        );
    }

    #[test]
    fn test_threshold_scenario() {
        let query = vec![1.0, 0.0];
        let embeddings = matrix(&[
            vec![1.0, 0.0],
            vec![0.8, 0.6],
            vec![0.0, 1.0],
            vec![-1.0, 0.0],
        ]);

        let matches = batch_similarity_with_threshold(&query, &embeddings, 0.5);
        assert_eq!(matches.count(), 2);
        assert_eq!(matches.indices, vec![0, 1]);
        assert!((matches.scores[0] - 1.0).abs() < 1e-6);
        assert!((matches.scores[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_is_strict_and_order_preserving() {
        let query = vec![1.0, 0.0];
        // Scores descend then ascend; output must follow row order
        let embeddings = matrix(&[
            vec![0.6, 0.8],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.8, 0.6],
        ]);

        let scores = batch_cosine_similarity(&query, &embeddings);
        let matches = batch_similarity_with_threshold(&query, &embeddings, scores[0]);
        // Row 0 scores exactly the threshold and is excluded
        assert_eq!(matches.indices, vec![1, 3]);
        assert!(matches.indices.windows(2).all(|w| w[0] < w[1]));
        for result in matches.iter() {
            assert!(result.score > scores[0]);
        }
    }

    #[test]
    fn test_threshold_degenerate_inputs() {
        let empty_rows: Vec<Vec<f32>> = Vec::new();
        let empty = matrix(&empty_rows);
        assert!(batch_similarity_with_threshold(&[1.0], &empty, 0.0).is_empty());

        let embeddings = matrix(&[vec![1.0, 0.0]]);
        assert!(batch_similarity_with_threshold(&[], &embeddings, 0.0).is_empty());
        assert!(batch_cosine_similarity(&[], &embeddings).is_empty());
    }

    #[test]
    fn test_into_variants_respect_buffer_capacity() {
        let query = vec![1.0, 0.0];
        let embeddings = matrix(&[vec![1.0, 0.0], vec![0.8, 0.6], vec![0.0, 1.0]]);

        let mut scores = [f32::NAN; 3];
        assert_eq!(
            batch_cosine_similarity_into(&query, &embeddings, &mut scores),
            3
        );
        assert!((scores[1] - 0.8).abs() < 1e-6);

        let mut short = [0.0; 2];
        assert_eq!(
            batch_cosine_similarity_into(&query, &embeddings, &mut short),
            0
        );

        let mut out_scores = [-7.0; 3];
        let mut out_indices = [99u32; 3];
        let count = batch_similarity_with_threshold_into(
            &query,
            &embeddings,
            0.5,
            &mut out_scores,
            &mut out_indices,
        );
        assert_eq!(count, 2);
        assert_eq!(&out_indices[..count], &[0, 1]);
        // Slots past count are untouched
        assert_eq!(out_indices[2], 99);
        assert_eq!(out_scores[2], -7.0);
    }
}
