//! Deterministic content fingerprints for deduplication.
//!
//! A fingerprint is the first 8 bytes of the SHA-256 digest of the content,
//! rendered as 16 lowercase hex characters. There is no per-process seed, so
//! fingerprints are stable across restarts and across hosts.

use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a fingerprint in hex characters.
pub const FINGERPRINT_HEX_LEN: usize = 16;

/// Fixed-width lowercase hex fingerprint of some content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Accepts a string that is exactly 16 lowercase hex characters.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let well_formed = value.len() == FINGERPRINT_HEX_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        well_formed.then(|| Self(value.to_string()))
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentFingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fingerprint arbitrary bytes. The empty slice is valid input.
pub fn hash_content(content: &[u8]) -> ContentFingerprint {
    let digest = Sha256::digest(content);
    let hex: String = digest[..FINGERPRINT_HEX_LEN / 2]
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect();
    ContentFingerprint(hex)
}

/// Fingerprint UTF-8 text.
pub fn hash_str(content: &str) -> ContentFingerprint {
    hash_content(content.as_bytes())
}
