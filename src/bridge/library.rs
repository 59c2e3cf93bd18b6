//! Loading the native library and binding its symbols.

use std::ffi::{CStr, c_char, c_int, c_void};
use std::path::{Path, PathBuf};

use libloading::Library;

use crate::error::{VectorOpsError, VectorOpsResult};

type CosineSimilarityFn = unsafe extern "C" fn(*const f32, *const f32, *const u32, *mut f32);
type BatchCosineSimilarityFn = unsafe extern "C" fn(*const f32, *const f32, u32, u32, *mut f32);
type BatchThresholdFn =
    unsafe extern "C" fn(*const f32, *const f32, u32, u32, f32, *mut f32, *mut u32) -> u32;
type NormalizeVectorFn = unsafe extern "C" fn(*mut f32, u32);
type VectorMagnitudeFn = unsafe extern "C" fn(*const f32, u32) -> f32;
type HashContentFn = unsafe extern "C" fn(*const c_char, *mut c_char);
type ValidateBlobFn = unsafe extern "C" fn(*const c_void, u32) -> bool;
type VersionFn = unsafe extern "C" fn() -> *const c_char;
type HasSimdFn = unsafe extern "C" fn() -> c_int;

/// Function table of a loaded native library.
///
/// The pointers stay valid for as long as `_library` is alive; both live and
/// die together in this struct.
pub(crate) struct NativeLibrary {
    path: PathBuf,
    pub(crate) cosine_similarity: CosineSimilarityFn,
    pub(crate) batch_cosine_similarity: BatchCosineSimilarityFn,
    pub(crate) batch_similarity_with_threshold: BatchThresholdFn,
    pub(crate) normalize_vector: NormalizeVectorFn,
    pub(crate) vector_magnitude: VectorMagnitudeFn,
    pub(crate) hash_content: HashContentFn,
    pub(crate) validate_embedding_blob: ValidateBlobFn,
    version: VersionFn,
    has_simd: HasSimdFn,
    _library: Library,
}

impl std::fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Copies one symbol out of the library as a plain function pointer.
///
/// # Safety
/// `T` must match the exported function's real signature.
unsafe fn bind<T: Copy>(library: &Library, path: &Path, name: &str) -> VectorOpsResult<T> {
    let symbol = format!("{name}\0");
    let bound = unsafe { library.get::<T>(symbol.as_bytes()) }.map_err(|_| {
        VectorOpsError::SymbolMissing {
            symbol: name.to_string(),
            path: path.to_path_buf(),
        }
    })?;
    Ok(*bound)
}

impl NativeLibrary {
    /// Loads the library at `path` and binds every exported entry point.
    ///
    /// A single missing symbol fails the whole load.
    pub(crate) fn load(path: &Path) -> VectorOpsResult<Self> {
        // Loading runs the library's initializers
        let library = unsafe { Library::new(path) }.map_err(|source| {
            VectorOpsError::LibraryLoad {
                path: path.to_path_buf(),
                source,
            }
        })?;

        unsafe {
            Ok(Self {
                path: path.to_path_buf(),
                cosine_similarity: bind(&library, path, "cosine_similarity")?,
                batch_cosine_similarity: bind(&library, path, "batch_cosine_similarity")?,
                batch_similarity_with_threshold: bind(
                    &library,
                    path,
                    "batch_similarity_with_threshold",
                )?,
                normalize_vector: bind(&library, path, "normalize_vector")?,
                vector_magnitude: bind(&library, path, "vector_magnitude")?,
                hash_content: bind(&library, path, "hash_content")?,
                validate_embedding_blob: bind(&library, path, "validate_embedding_blob")?,
                version: bind(&library, path, "tessera_vector_ops_version")?,
                has_simd: bind(&library, path, "tessera_has_simd")?,
                _library: library,
            })
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn version(&self) -> Option<String> {
        let raw = unsafe { (self.version)() };
        if raw.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned())
    }

    pub(crate) fn has_simd(&self) -> bool {
        unsafe { (self.has_simd)() != 0 }
    }
}
