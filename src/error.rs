//! Error types for the vector operations engine
//!
//! This module provides structured error types using thiserror. None of these
//! cross the native ABI: the exported functions map every failure to a
//! sentinel value, and the bridge logs instead of raising.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for vector operations and native library handling
#[derive(Error, Debug)]
pub enum VectorOpsError {
    /// Query and embedding rows disagree on dimension
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure the query and all embeddings come from the same model"
    )]
    InvalidDimension { expected: usize, actual: usize },

    /// Rows of an embedding matrix have different lengths
    #[error(
        "Embedding row {row} has {actual} elements, expected {expected}\nSuggestion: All rows of an embedding matrix must share one dimension"
    )]
    RaggedMatrix {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// More rows than a 32-bit index can address
    #[error("Embedding matrix has {rows} rows, the maximum is {}", u32::MAX)]
    TooManyRows { rows: usize },

    /// The native library was never loaded for this process
    #[error("Native vector library unavailable: {reason}")]
    LibraryUnavailable { reason: String },

    #[error("Failed to load native library '{path}': {source}")]
    LibraryLoad {
        path: PathBuf,
        source: libloading::Error,
    },

    #[error("Native library '{path}' does not export symbol '{symbol}'")]
    SymbolMissing { symbol: String, path: PathBuf },

    /// Serialized embedding is not a whole number of f32 values
    #[error(
        "Malformed embedding blob of {byte_len} bytes\nSuggestion: Embedding blobs must be a multiple of 4 bytes (one f32 per element)"
    )]
    MalformedBlob { byte_len: usize },

    #[error("Null input pointer")]
    NullInput,
}

impl VectorOpsError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::InvalidDimension { .. } => "INVALID_DIMENSION",
            Self::RaggedMatrix { .. } => "RAGGED_MATRIX",
            Self::TooManyRows { .. } => "TOO_MANY_ROWS",
            Self::LibraryUnavailable { .. } => "LIBRARY_UNAVAILABLE",
            Self::LibraryLoad { .. } => "LIBRARY_LOAD_ERROR",
            Self::SymbolMissing { .. } => "SYMBOL_MISSING",
            Self::MalformedBlob { .. } => "MALFORMED_BLOB",
            Self::NullInput => "NULL_INPUT",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::LibraryUnavailable { .. } | Self::LibraryLoad { .. } => vec![
                "Build the native library with 'cargo build --release'",
                "Add its directory to native.library_paths in .tessera/settings.toml",
                "Enhanced calls keep working through the Rust reference implementation",
            ],
            Self::SymbolMissing { .. } => vec![
                "The library on the search path is from an incompatible build",
                "Rebuild it from the same version as the host binding",
            ],
            Self::MalformedBlob { .. } => vec![
                "Reject the blob before persisting it",
                "Re-encode the embedding as native-endian f32 values",
            ],
            Self::InvalidDimension { .. } | Self::RaggedMatrix { .. } => vec![
                "Check that all embeddings were produced by the same model",
            ],
            _ => vec![],
        }
    }
}

/// Result type alias for vector operations
pub type VectorOpsResult<T> = Result<T, VectorOpsError>;
