//! Host binding for the native library with transparent fallback.
//!
//! A [`NativeBridge`] owns an ordered list of candidate library paths and a
//! load-once cell. The first call that needs the library probes the
//! candidates, loads the first one that exists and binds its symbols. The
//! outcome, available or unavailable, is fixed for the bridge's lifetime;
//! a failed load is logged once and never retried.
//!
//! # Call tiers
//! - `raw_*` methods only ever call native code. When the library is
//!   unavailable they return a safe default: 0.0, an empty result, `None` or
//!   `false`.
//! - The unprefixed methods call native code when it is loaded and otherwise
//!   run the Rust reference implementation in [`crate::vector`]. Callers see
//!   the same results either way.
//!
//! # Process-wide instance
//! [`NativeBridge::global`] builds a bridge from [`Settings::load`] on first
//! use. Hosts that want a specific candidate list call
//! [`NativeBridge::install_global`] before anything touches the global.

mod candidates;
mod library;

pub use candidates::LibraryCandidates;

use std::ffi::{CString, c_char};
use std::path::Path;
use std::sync::OnceLock;

use tracing::{debug, info, warn};

use crate::blob;
use crate::config::Settings;
use crate::error::{VectorOpsError, VectorOpsResult};
use crate::fingerprint::{self, ContentFingerprint, FINGERPRINT_HEX_LEN};
use crate::vector::{self, EmbeddingMatrix, ThresholdMatches};
use library::NativeLibrary;

static GLOBAL: OnceLock<NativeBridge> = OnceLock::new();

/// Observable load status of a bridge.
///
/// Loading itself happens inside the one-time initialization barrier, so
/// observers see either `Uninitialized` or one of the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No call has needed the library yet
    Uninitialized,
    Available,
    Unavailable,
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Uninitialized => "uninitialized",
            Self::Available => "available",
            Self::Unavailable => "unavailable",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
enum NativeState {
    Available(NativeLibrary),
    Unavailable { reason: String },
}

/// Native library handle plus the reference-implementation fallback.
#[derive(Debug)]
pub struct NativeBridge {
    candidates: LibraryCandidates,
    enabled: bool,
    state: OnceLock<NativeState>,
}

impl NativeBridge {
    /// Bridge that probes `candidates` in order on first use.
    pub fn new(candidates: LibraryCandidates) -> Self {
        Self {
            candidates,
            enabled: true,
            state: OnceLock::new(),
        }
    }

    /// Bridge that never loads native code; every enhanced call falls back.
    pub fn disabled() -> Self {
        Self {
            candidates: LibraryCandidates::new(Vec::<std::path::PathBuf>::new()),
            enabled: false,
            state: OnceLock::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        if !settings.native.enabled {
            return Self::disabled();
        }
        Self::new(LibraryCandidates::from_config(&settings.native))
    }

    /// The process-wide bridge, built from the layered settings on first use.
    pub fn global() -> &'static NativeBridge {
        GLOBAL.get_or_init(|| {
            let settings = Settings::load().unwrap_or_else(|e| {
                warn!("failed to load settings, using defaults: {e}");
                Settings::default()
            });
            NativeBridge::from_settings(&settings)
        })
    }

    /// Installs `bridge` as the process-wide instance.
    ///
    /// # Errors
    /// Returns the bridge back if the global was already initialized.
    pub fn install_global(bridge: NativeBridge) -> Result<(), NativeBridge> {
        GLOBAL.set(bridge)
    }

    fn native(&self) -> Option<&NativeLibrary> {
        match self.state.get_or_init(|| self.load()) {
            NativeState::Available(library) => Some(library),
            NativeState::Unavailable { .. } => None,
        }
    }

    fn load(&self) -> NativeState {
        if !self.enabled {
            info!("native vector library disabled by configuration");
            return NativeState::Unavailable {
                reason: "disabled by configuration".to_string(),
            };
        }

        for path in self.candidates.paths() {
            debug!("probing native library candidate {}", path.display());
        }

        let Some(path) = self.candidates.first_existing() else {
            let reason = format!(
                "no native library found in {} candidate paths",
                self.candidates.paths().len()
            );
            warn!("native vector library unavailable, using Rust fallback: {reason}");
            return NativeState::Unavailable { reason };
        };

        match NativeLibrary::load(path) {
            Ok(library) => {
                info!("native vector library loaded from {}", path.display());
                NativeState::Available(library)
            }
            Err(e) => {
                warn!("native vector library unavailable, using Rust fallback: {e}");
                NativeState::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Current state without triggering a load.
    pub fn state(&self) -> LoadState {
        match self.state.get() {
            None => LoadState::Uninitialized,
            Some(NativeState::Available(_)) => LoadState::Available,
            Some(NativeState::Unavailable { .. }) => LoadState::Unavailable,
        }
    }

    /// Whether native code is in use. Triggers the one-time load.
    pub fn is_available(&self) -> bool {
        self.native().is_some()
    }

    /// Why the library is unavailable, once a load has been attempted.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self.state.get() {
            Some(NativeState::Unavailable { reason }) => Some(reason),
            _ => None,
        }
    }

    /// `Ok` when native code is loaded. Triggers the one-time load.
    ///
    /// # Errors
    /// `LibraryUnavailable` carrying the recorded reason.
    pub fn ensure_available(&self) -> VectorOpsResult<()> {
        if self.is_available() {
            return Ok(());
        }
        Err(VectorOpsError::LibraryUnavailable {
            reason: self.unavailable_reason().unwrap_or("unknown").to_string(),
        })
    }

    pub fn candidates(&self) -> &LibraryCandidates {
        &self.candidates
    }

    /// Path the library was loaded from.
    pub fn loaded_path(&self) -> Option<&Path> {
        self.native().map(NativeLibrary::path)
    }

    /// Version string reported by the loaded library.
    pub fn native_version(&self) -> Option<String> {
        self.native().and_then(NativeLibrary::version)
    }

    pub fn native_has_simd(&self) -> Option<bool> {
        self.native().map(NativeLibrary::has_simd)
    }

    // Raw tier

    pub fn raw_cosine_similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        let Some(native) = self.native() else {
            return 0.0;
        };
        if a.len() != b.len() {
            return 0.0;
        }
        let Ok(len) = u32::try_from(a.len()) else {
            return 0.0;
        };
        let mut score = 0.0f32;
        unsafe { (native.cosine_similarity)(a.as_ptr(), b.as_ptr(), &len, &mut score) };
        score
    }

    pub fn raw_batch_cosine_similarity(
        &self,
        query: &[f32],
        embeddings: &EmbeddingMatrix<'_>,
    ) -> Vec<f32> {
        let Some(native) = self.native() else {
            return Vec::new();
        };
        let Some((rows, dim)) = abi_shape(query, embeddings) else {
            return Vec::new();
        };

        let mut scores = vec![0.0f32; embeddings.rows()];
        unsafe {
            (native.batch_cosine_similarity)(
                query.as_ptr(),
                embeddings.as_slice().as_ptr(),
                rows,
                dim,
                scores.as_mut_ptr(),
            )
        };
        scores
    }

    pub fn raw_batch_similarity_with_threshold(
        &self,
        query: &[f32],
        embeddings: &EmbeddingMatrix<'_>,
        threshold: f32,
    ) -> ThresholdMatches {
        let Some(native) = self.native() else {
            return ThresholdMatches::default();
        };
        let Some((rows, dim)) = abi_shape(query, embeddings) else {
            return ThresholdMatches::default();
        };

        let mut scores = vec![0.0f32; embeddings.rows()];
        let mut indices = vec![0u32; embeddings.rows()];
        let count = unsafe {
            (native.batch_similarity_with_threshold)(
                query.as_ptr(),
                embeddings.as_slice().as_ptr(),
                rows,
                dim,
                threshold,
                scores.as_mut_ptr(),
                indices.as_mut_ptr(),
            )
        };
        let count = (count as usize).min(embeddings.rows());
        scores.truncate(count);
        indices.truncate(count);
        ThresholdMatches { scores, indices }
    }

    /// Returns `false` without touching `v` when native code is unavailable.
    pub fn raw_normalize_vector(&self, v: &mut [f32]) -> bool {
        let Some(native) = self.native() else {
            return false;
        };
        let Ok(len) = u32::try_from(v.len()) else {
            return false;
        };
        unsafe { (native.normalize_vector)(v.as_mut_ptr(), len) };
        true
    }

    pub fn raw_vector_magnitude(&self, v: &[f32]) -> f32 {
        let Some(native) = self.native() else {
            return 0.0;
        };
        let Ok(len) = u32::try_from(v.len()) else {
            return 0.0;
        };
        unsafe { (native.vector_magnitude)(v.as_ptr(), len) }
    }

    /// `None` when native code is unavailable or `content` holds a NUL byte,
    /// which the C-string ABI cannot carry.
    pub fn raw_hash_content(&self, content: &[u8]) -> Option<ContentFingerprint> {
        let native = self.native()?;
        let content = CString::new(content).ok()?;

        let mut out = [0 as c_char; FINGERPRINT_HEX_LEN + 1];
        unsafe { (native.hash_content)(content.as_ptr(), out.as_mut_ptr()) };

        let bytes: Vec<u8> = out[..FINGERPRINT_HEX_LEN]
            .iter()
            .map(|&c| c as u8)
            .collect();
        std::str::from_utf8(&bytes)
            .ok()
            .and_then(ContentFingerprint::parse)
    }

    pub fn raw_validate_embedding_blob(&self, blob: Option<&[u8]>) -> bool {
        let Some(native) = self.native() else {
            return false;
        };
        let (ptr, len) = match blob {
            Some(bytes) => (bytes.as_ptr().cast(), bytes.len()),
            None => (std::ptr::null(), 0),
        };
        let Ok(len) = u32::try_from(len) else {
            return false;
        };
        unsafe { (native.validate_embedding_blob)(ptr, len) }
    }

    // Enhanced tier

    /// Cosine similarity; 0.0 for vectors of different length.
    pub fn cosine_similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            warn!(
                "cosine similarity of vectors with lengths {} and {} is undefined",
                a.len(),
                b.len()
            );
            return 0.0;
        }
        if self.is_available() && u32::try_from(a.len()).is_ok() {
            self.raw_cosine_similarity(a, b)
        } else {
            vector::cosine_similarity(a, b)
        }
    }

    pub fn batch_cosine_similarity(
        &self,
        query: &[f32],
        embeddings: &EmbeddingMatrix<'_>,
    ) -> Vec<f32> {
        if self.is_available() && u32::try_from(query.len()).is_ok() {
            self.raw_batch_cosine_similarity(query, embeddings)
        } else {
            vector::batch_cosine_similarity(query, embeddings)
        }
    }

    pub fn batch_similarity_with_threshold(
        &self,
        query: &[f32],
        embeddings: &EmbeddingMatrix<'_>,
        threshold: f32,
    ) -> ThresholdMatches {
        if self.is_available() && u32::try_from(query.len()).is_ok() {
            self.raw_batch_similarity_with_threshold(query, embeddings, threshold)
        } else {
            vector::batch_similarity_with_threshold(query, embeddings, threshold)
        }
    }

    pub fn normalize_vector(&self, v: &mut [f32]) {
        if !self.raw_normalize_vector(v) {
            vector::normalize_vector(v);
        }
    }

    pub fn vector_magnitude(&self, v: &[f32]) -> f32 {
        if self.is_available() && u32::try_from(v.len()).is_ok() {
            self.raw_vector_magnitude(v)
        } else {
            vector::vector_magnitude(v)
        }
    }

    pub fn hash_content(&self, content: &[u8]) -> ContentFingerprint {
        self.raw_hash_content(content)
            .unwrap_or_else(|| fingerprint::hash_content(content))
    }

    pub fn validate_embedding_blob(&self, blob: Option<&[u8]>) -> bool {
        let fits_abi = blob.is_none_or(|bytes| u32::try_from(bytes.len()).is_ok());
        if self.is_available() && fits_abi {
            self.raw_validate_embedding_blob(blob)
        } else {
            blob::validate_embedding_blob(blob)
        }
    }
}

/// Shape of a batch as ABI arguments, or `None` if the batch is degenerate
/// or mismatched.
fn abi_shape(query: &[f32], embeddings: &EmbeddingMatrix<'_>) -> Option<(u32, u32)> {
    if query.is_empty() || embeddings.is_empty() {
        return None;
    }
    if query.len() != embeddings.dimension() {
        warn!(
            "batch rejected: query dimension {} does not match embedding dimension {}",
            query.len(),
            embeddings.dimension()
        );
        return None;
    }
    let rows = u32::try_from(embeddings.rows()).ok()?;
    let dim = u32::try_from(embeddings.dimension()).ok()?;
    Some((rows, dim))
}
