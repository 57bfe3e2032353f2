//! # Near-duplicate fingerprints
//!
//! This crate turns canonical text into compact, similarity-preserving
//! signatures used for near-duplicate detection.
//!
//! ## Contract
//!
//! - Input is always [`CanonicalText`]; this crate never normalizes.
//! - The API is a pure function of `(canonical_text, config)` with no I/O and
//!   no reliance on clocks or global process state.
//!
//! ## Pipeline
//!
//! 1.  **Shingling**: the canonical text is cut into overlapping windows of
//!     `ngram_size` words. Texts shorter than that become a single shingle;
//!     empty text has none.
//! 2.  **Hashing**: every shingle gets a 64-bit base hash (xxh3).
//! 3.  **MinHashing**: `num_hashes` seeded permutations of the base hashes are
//!     each reduced to their minimum. The fraction of equal slots between two
//!     signatures estimates the Jaccard similarity of their shingle sets.
//!
//! ## Example Usage
//!
//! ```
//! use canonical::CanonicalText;
//! use perceptual::{compute_signature, jaccard, PerceptualConfig};
//!
//! let cfg = PerceptualConfig::default();
//! let a = compute_signature(&CanonicalText::new("The water cycle describes how water evaporates."), &cfg);
//! let b = compute_signature(&CanonicalText::new("the WATER cycle describes how water evaporates!"), &cfg);
//!
//! assert_eq!(a.len(), cfg.num_hashes);
//! assert_eq!(jaccard(&a, &b).unwrap(), 1.0);
//! ```

pub mod config;
pub mod fingerprint;
mod minhash;
mod shingles;

pub use canonical::CanonicalText;

pub use crate::config::{PerceptualConfig, PerceptualError, SIGNATURE_VERSION};
pub use crate::fingerprint::{jaccard, NgramHashSet, Signature};
pub use crate::minhash::{compute_signature, minhash_signature, slot_seed};
pub use crate::shingles::{hash_shingle, ngram_hashes, shingle_hash, shingles};

/// Validate `cfg` and compute the signature of raw `text`.
///
/// Convenience for callers that hold unnormalized text.
pub fn signature_for_text(text: &str, cfg: &PerceptualConfig) -> Result<Signature, PerceptualError> {
    cfg.validate()?;
    Ok(compute_signature(&CanonicalText::new(text), cfg))
}
