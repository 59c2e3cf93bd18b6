//! Structural validation of serialized embedding buffers.
//!
//! A blob is a run of native-endian f32 values. Validation is a shape check
//! only: it looks at whether a buffer exists and at its length, never at the
//! bytes themselves.

use crate::error::{VectorOpsError, VectorOpsResult};
use crate::vector::BYTES_PER_F32;

/// Shape rules for a blob descriptor, in priority order:
/// null -> false, empty -> true, ragged length -> false, otherwise true.
#[inline]
pub const fn validate_blob_shape(is_null: bool, byte_len: usize) -> bool {
    if is_null {
        return false;
    }
    byte_len == 0 || byte_len % BYTES_PER_F32 == 0
}

/// Validates a blob, with `None` standing for a null pointer.
pub fn validate_embedding_blob(blob: Option<&[u8]>) -> bool {
    match blob {
        Some(bytes) => validate_blob_shape(false, bytes.len()),
        None => validate_blob_shape(true, 0),
    }
}

/// Decodes a blob into f32 values.
///
/// # Errors
/// `MalformedBlob` if the length is not a multiple of 4.
pub fn decode_embedding_blob(bytes: &[u8]) -> VectorOpsResult<Vec<f32>> {
    if !validate_blob_shape(false, bytes.len()) {
        return Err(VectorOpsError::MalformedBlob {
            byte_len: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(BYTES_PER_F32)
        .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Encodes values as a native-endian blob.
pub fn encode_embedding_blob(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}
