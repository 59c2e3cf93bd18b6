//! C ABI exported by the `cdylib` build of this crate.
//!
//! Every export checks its pointers, runs the reference implementation inside
//! `catch_unwind`, and reports failure through a sentinel value: 0.0 for
//! similarities and magnitudes, count 0, `false`, or an empty string. Nothing
//! unwinds across the boundary. Lengths and counts are `u32`; floats are
//! native-endian f32; matrices are row-major.
//!
//! These functions never consult the bridge. A host that loads this library
//! gets the reference implementation directly.

use std::ffi::{CStr, c_char, c_int, c_void};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::slice;

use crate::blob::validate_blob_shape;
use crate::error::{VectorOpsError, VectorOpsResult};
use crate::fingerprint::{FINGERPRINT_HEX_LEN, hash_content as fingerprint_bytes};
use crate::vector::{self, EmbeddingMatrix};

/// Bytes a `hash_content` output buffer must hold: 16 hex chars plus NUL.
pub const FINGERPRINT_BUFFER_LEN: usize = FINGERPRINT_HEX_LEN + 1;

static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();

fn guarded<T>(fallback: T, f: impl FnOnce() -> T) -> T {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or(fallback)
}

/// Builds a slice from a possibly-null pointer. Zero length never touches
/// the pointer; a null pointer with nonzero length is `NullInput`.
///
/// # Safety
/// A non-null `ptr` must be valid for `len` reads.
unsafe fn input<'a>(ptr: *const f32, len: usize) -> VectorOpsResult<&'a [f32]> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(VectorOpsError::NullInput);
    }
    Ok(unsafe { slice::from_raw_parts(ptr, len) })
}

/// Cosine similarity of two vectors of `*len` elements, written to `*out`.
///
/// # Safety
/// `a` and `b` must each point to `*len` floats, `len` to one `u32` and `out`
/// to one writable float. Null pointers are tolerated and yield 0.0 (or no
/// write when `out` is null).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cosine_similarity(
    a: *const f32,
    b: *const f32,
    len: *const u32,
    out: *mut f32,
) {
    if out.is_null() {
        return;
    }
    let score = guarded(0.0, || {
        if len.is_null() {
            return 0.0;
        }
        let len = unsafe { *len } as usize;
        match unsafe { (input(a, len), input(b, len)) } {
            (Ok(a), Ok(b)) => vector::cosine_similarity(a, b),
            _ => 0.0,
        }
    });
    unsafe { *out = score };
}

/// Writes `num_embeddings` scores for `query` against a row-major matrix.
///
/// # Safety
/// `query` must point to `vector_dim` floats, `embeddings` to
/// `num_embeddings * vector_dim` floats and `results` to `num_embeddings`
/// writable floats.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn batch_cosine_similarity(
    query: *const f32,
    embeddings: *const f32,
    num_embeddings: u32,
    vector_dim: u32,
    results: *mut f32,
) {
    if results.is_null() || num_embeddings == 0 {
        return;
    }
    let rows = num_embeddings as usize;
    let dim = vector_dim as usize;

    guarded((), || {
        let out = unsafe { slice::from_raw_parts_mut(results, rows) };
        let Some(total) = rows.checked_mul(dim) else {
            out.fill(0.0);
            return;
        };
        let (Ok(query), Ok(data)) = (unsafe { input(query, dim) }, unsafe {
            input(embeddings, total)
        }) else {
            out.fill(0.0);
            return;
        };
        if dim == 0 {
            // Empty vectors have similarity 0
            out.fill(0.0);
            return;
        }
        match EmbeddingMatrix::from_slice(data, dim) {
            Ok(matrix) => {
                vector::batch_cosine_similarity_into(query, &matrix, out);
            }
            Err(_) => out.fill(0.0),
        }
    });
}

/// Scores a matrix and keeps rows strictly above `threshold`, in row order.
///
/// Returns the number of valid entries written to the front of `results`
/// and `indices`.
///
/// # Safety
/// `results` and `indices` must each have room for `num_embeddings` entries;
/// input pointers as for [`batch_cosine_similarity`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn batch_similarity_with_threshold(
    query: *const f32,
    embeddings: *const f32,
    num_embeddings: u32,
    vector_dim: u32,
    threshold: f32,
    results: *mut f32,
    indices: *mut u32,
) -> u32 {
    if results.is_null() || indices.is_null() || num_embeddings == 0 || vector_dim == 0 {
        return 0;
    }
    let rows = num_embeddings as usize;
    let dim = vector_dim as usize;

    guarded(0, || {
        let Some(total) = rows.checked_mul(dim) else {
            return 0;
        };
        let (Ok(query), Ok(data)) = (unsafe { input(query, dim) }, unsafe {
            input(embeddings, total)
        }) else {
            return 0;
        };
        let Ok(matrix) = EmbeddingMatrix::from_slice(data, dim) else {
            return 0;
        };
        let out_scores = unsafe { slice::from_raw_parts_mut(results, rows) };
        let out_indices = unsafe { slice::from_raw_parts_mut(indices, rows) };
        vector::batch_similarity_with_threshold_into(
            query,
            &matrix,
            threshold,
            out_scores,
            out_indices,
        ) as u32
    })
}

/// Normalizes `vec` to unit length in place. Zero vectors are left as-is.
///
/// # Safety
/// `vec` must point to `len` writable floats.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn normalize_vector(vec: *mut f32, len: u32) {
    if vec.is_null() || len == 0 {
        return;
    }
    guarded((), || {
        let values = unsafe { slice::from_raw_parts_mut(vec, len as usize) };
        vector::normalize_vector(values);
    });
}

/// Euclidean norm of `vec`.
///
/// # Safety
/// `vec` must point to `len` floats.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vector_magnitude(vec: *const f32, len: u32) -> f32 {
    guarded(0.0, || match unsafe { input(vec, len as usize) } {
        Ok(values) => vector::vector_magnitude(values),
        Err(_) => 0.0,
    })
}

/// Fingerprints a NUL-terminated byte string into `out` as 16 lowercase hex
/// characters followed by NUL. A null `content` writes the empty string.
///
/// # Safety
/// `content` must be NUL-terminated; `out` must hold
/// [`FINGERPRINT_BUFFER_LEN`] bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hash_content(content: *const c_char, out: *mut c_char) {
    if out.is_null() {
        return;
    }
    let out = unsafe { slice::from_raw_parts_mut(out.cast::<u8>(), FINGERPRINT_BUFFER_LEN) };
    out[0] = 0;
    if content.is_null() {
        return;
    }

    guarded((), || {
        let bytes = unsafe { CStr::from_ptr(content) }.to_bytes();
        let fingerprint = fingerprint_bytes(bytes);
        out[..FINGERPRINT_HEX_LEN].copy_from_slice(fingerprint.as_str().as_bytes());
        out[FINGERPRINT_HEX_LEN] = 0;
    });
}

/// Shape check for a serialized embedding. Never reads through `blob`.
#[unsafe(no_mangle)]
pub extern "C" fn validate_embedding_blob(blob: *const c_void, byte_len: u32) -> bool {
    validate_blob_shape(blob.is_null(), byte_len as usize)
}

/// Static NUL-terminated version string.
#[unsafe(no_mangle)]
pub extern "C" fn tessera_vector_ops_version() -> *const c_char {
    VERSION.as_ptr().cast()
}

/// 1 if the vectorized path uses hardware vector instructions, else 0.
#[unsafe(no_mangle)]
pub extern "C" fn tessera_has_simd() -> c_int {
    c_int::from(vector::has_simd())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn test_cosine_similarity_export() {
        let a = [1.0f32, 2.0, 3.0];
        let b = [-1.0f32, -2.0, -3.0];
        let len = 3u32;
        let mut out = f32::NAN;
        unsafe { cosine_similarity(a.as_ptr(), b.as_ptr(), &len, &mut out) };
        assert!((out + 1.0).abs() < 1e-6);

        // Null length is a zero result, not a crash
        unsafe { cosine_similarity(a.as_ptr(), b.as_ptr(), ptr::null(), &mut out) };
        assert_eq!(out, 0.0);

        unsafe { cosine_similarity(ptr::null(), b.as_ptr(), &len, &mut out) };
        assert_eq!(out, 0.0);
    }

    #[test]
    fn test_batch_exports() {
        let query = [1.0f32, 0.0];
        let embeddings = [1.0f32, 0.0, 0.8, 0.6, 0.0, 1.0, -1.0, 0.0];

        let mut scores = [f32::NAN; 4];
        unsafe {
            batch_cosine_similarity(
                query.as_ptr(),
                embeddings.as_ptr(),
                4,
                2,
                scores.as_mut_ptr(),
            )
        };
        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!((scores[1] - 0.8).abs() < 1e-6);
        assert!(scores[2].abs() < 1e-6);
        assert!((scores[3] + 1.0).abs() < 1e-6);

        let mut results = [0.0f32; 4];
        let mut indices = [0u32; 4];
        let count = unsafe {
            batch_similarity_with_threshold(
                query.as_ptr(),
                embeddings.as_ptr(),
                4,
                2,
                0.5,
                results.as_mut_ptr(),
                indices.as_mut_ptr(),
            )
        };
        assert_eq!(count, 2);
        assert_eq!(&indices[..2], &[0, 1]);
    }

    #[test]
    fn test_batch_exports_with_null_inputs() {
        let mut scores = [f32::NAN; 2];
        unsafe { batch_cosine_similarity(ptr::null(), ptr::null(), 2, 3, scores.as_mut_ptr()) };
        assert_eq!(scores, [0.0, 0.0]);

        let mut results = [0.0f32; 2];
        let mut indices = [0u32; 2];
        let count = unsafe {
            batch_similarity_with_threshold(
                ptr::null(),
                ptr::null(),
                2,
                3,
                0.0,
                results.as_mut_ptr(),
                indices.as_mut_ptr(),
            )
        };
        assert_eq!(count, 0);
    }

    #[test]
    fn test_vector_exports() {
        let mut v = [3.0f32, 4.0];
        assert_eq!(unsafe { vector_magnitude(v.as_ptr(), 2) }, 5.0);
        unsafe { normalize_vector(v.as_mut_ptr(), 2) };
        assert!((unsafe { vector_magnitude(v.as_ptr(), 2) } - 1.0).abs() < 1e-3);

        assert_eq!(unsafe { vector_magnitude(ptr::null(), 4) }, 0.0);
        unsafe { normalize_vector(ptr::null_mut(), 4) };
    }

    #[test]
    fn test_hash_content_export() {
        let mut out = [0 as c_char; FINGERPRINT_BUFFER_LEN];
        unsafe { hash_content(c"".as_ptr(), out.as_mut_ptr()) };
        let written = unsafe { CStr::from_ptr(out.as_ptr()) }.to_str().unwrap();
        assert_eq!(written, "e3b0c44298fc1c14");

        unsafe { hash_content(ptr::null(), out.as_mut_ptr()) };
        assert_eq!(out[0], 0);
    }

    #[test]
    fn test_validate_blob_export() {
        let bytes = [0u8; 8];
        let ptr = bytes.as_ptr().cast::<c_void>();
        assert!(validate_embedding_blob(ptr, 8));
        assert!(validate_embedding_blob(ptr, 0));
        assert!(!validate_embedding_blob(ptr, 6));
        assert!(!validate_embedding_blob(ptr::null(), 8));
        assert!(!validate_embedding_blob(ptr::null(), 0));
    }

    #[test]
    fn test_version_export() {
        let version = unsafe { CStr::from_ptr(tessera_vector_ops_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
        assert!(matches!(tessera_has_simd(), 0 | 1));
    }
}
