//! Reference implementation of the similarity engine.
//!
//! This is the code the native library exports through the C ABI and the
//! code the bridge falls back to when that library cannot be loaded. There
//! is exactly one implementation, so native and fallback results agree.
//!
//! # Architecture
//! - `math`: single-vector primitives with scalar and SIMD dot products
//! - `batch`: query-against-matrix scoring and the stable threshold filter
//! - `types`: `EmbeddingMatrix` and result containers

mod batch;
mod math;
mod types;

pub use batch::{
    batch_cosine_similarity, batch_cosine_similarity_into, batch_similarity_with_threshold,
    batch_similarity_with_threshold_into, try_batch_cosine_similarity,
    try_batch_similarity_with_threshold,
};
pub use math::{
    SIMD_LANES, cosine_similarity, cosine_similarity_scalar, dot_product, dot_product_scalar,
    dot_product_simd, has_simd, normalize_vector, vector_magnitude,
};
pub use types::{
    BYTES_PER_F32, EmbeddingMatrix, SimilarityResult, ThresholdMatches, VECTOR_DIMENSION_384,
};
