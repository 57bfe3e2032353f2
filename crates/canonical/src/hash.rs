//! Exact-match digests over canonical text.
//!
//! # Algorithm
//!
//! ```text
//! SHA-256(canonical_text_bytes)
//! ```
//!
//! There is no version prefix: two manifests normalized by the same
//! [`normalize`](crate::normalize) always agree on the digest of identical
//! text, which is what makes the exact index comparable across runs.
//!
//! The digest is kept as 32 raw bytes. Hex is only produced when a digest is
//! displayed or serialized.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// A 256-bit SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest256([u8; 32]);

impl Digest256 {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Digest256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest256({})", self.to_hex())
    }
}

impl FromStr for Digest256 {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Digest256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// SHA-256 of raw bytes. Callers are expected to pass canonical text.
pub fn digest_bytes(bytes: &[u8]) -> Digest256 {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Digest256(hasher.finalize().into())
}

/// Hash arbitrary text with SHA-256 and return a hex digest.
///
/// This does **not** normalize. It is meant for diagnostics, e.g. logging a
/// stable handle for a benchmark file's raw content.
///
/// ```rust
/// use canonical::hash_text;
///
/// let hash = hash_text("hello world");
/// assert_eq!(hash.len(), 64);
/// assert_ne!(hash, hash_text("Hello world"));
/// ```
pub fn hash_text(text: &str) -> String {
    digest_bytes(text.as_bytes()).to_hex()
}
