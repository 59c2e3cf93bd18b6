//! Vector similarity acceleration engine.
//!
//! The same crate builds two things: a `cdylib` exporting a fixed C ABI
//! (see [`ffi`] and `include/tessera_vector_ops.h`), and an `rlib` with the
//! Rust reference implementation plus a [`NativeBridge`] that loads the
//! `cdylib` at runtime and falls back to the reference code when it cannot.

pub mod blob;
pub mod bridge;
pub mod config;
pub mod display;
pub mod error;
pub mod ffi;
pub mod fingerprint;
pub mod vector;

// Explicit exports for better API clarity
pub use blob::{decode_embedding_blob, encode_embedding_blob, validate_embedding_blob};
pub use bridge::{LibraryCandidates, LoadState, NativeBridge};
pub use config::Settings;
pub use error::{VectorOpsError, VectorOpsResult};
pub use fingerprint::{ContentFingerprint, hash_content};
pub use vector::{
    EmbeddingMatrix, SimilarityResult, ThresholdMatches, batch_cosine_similarity,
    batch_similarity_with_threshold, cosine_similarity, normalize_vector, vector_magnitude,
};
