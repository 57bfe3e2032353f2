//! Configuration and error types for shingling and MinHash.
//!
//! This module is free of any I/O or environment-dependent behavior so that
//! signatures are a pure function of `(canonical_text, config)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signature algorithm version. Bumped whenever shingling, hashing or the
/// permutation family changes in a way that alters signatures.
pub const SIGNATURE_VERSION: u32 = 1;

/// Configuration for n-gram shingling and MinHash signatures.
///
/// Two signatures are only comparable when they were produced under the same
/// `ngram_size`, `num_hashes` and `seed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerceptualConfig {
    /// Signature algorithm version.
    ///
    /// Must equal [`SIGNATURE_VERSION`]; [`validate`](Self::validate) rejects
    /// anything else, so a config written for another algorithm revision
    /// never builds or queries an index.
    #[serde(default = "PerceptualConfig::default_version")]
    pub version: u32,
    /// Number of words per shingle.
    ///
    /// Larger values are stricter about word order; smaller values tolerate
    /// more local edits.
    #[serde(default = "PerceptualConfig::default_ngram_size")]
    pub ngram_size: usize,
    /// Signature length `H`. More hashes lower the variance of the Jaccard
    /// estimate at the cost of memory and CPU.
    #[serde(default = "PerceptualConfig::default_num_hashes")]
    pub num_hashes: usize,
    /// Seed for the hash family.
    ///
    /// Equal seeds and equal canonical text give bit-identical signatures.
    #[serde(default = "PerceptualConfig::default_seed")]
    pub seed: u64,
    /// Compute signature slots on the rayon pool.
    #[serde(default)]
    pub use_parallel: bool,
}

impl PerceptualConfig {
    pub(crate) fn default_version() -> u32 {
        SIGNATURE_VERSION
    }

    pub(crate) fn default_ngram_size() -> usize {
        5
    }

    pub(crate) fn default_num_hashes() -> usize {
        64
    }

    pub(crate) fn default_seed() -> u64 {
        0xF00D_BAAD_F00D_BAAD
    }

    /// Create a new configuration with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shingle size in words. Typical values: 3-9.
    pub fn with_ngram_size(mut self, ngram_size: usize) -> Self {
        self.ngram_size = ngram_size;
        self
    }

    /// Set the signature length. Typical values: 64-256.
    pub fn with_num_hashes(mut self, num_hashes: usize) -> Self {
        self.num_hashes = num_hashes;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable parallel slot computation. Output is identical
    /// either way; parallel only pays off for long documents or large `H`.
    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), PerceptualError> {
        if self.version != SIGNATURE_VERSION {
            return Err(PerceptualError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.ngram_size < 1 {
            return Err(PerceptualError::InvalidConfigNgramSize {
                ngram_size: self.ngram_size,
            });
        }
        if self.num_hashes < 1 {
            return Err(PerceptualError::InvalidConfigNumHashes {
                num_hashes: self.num_hashes,
            });
        }
        Ok(())
    }
}

impl Default for PerceptualConfig {
    fn default() -> Self {
        Self {
            version: Self::default_version(),
            ngram_size: Self::default_ngram_size(),
            num_hashes: Self::default_num_hashes(),
            seed: Self::default_seed(),
            use_parallel: false,
        }
    }
}

/// Errors returned by shingling and MinHash.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PerceptualError {
    #[error("invalid config: ngram_size must be >= 1 (got {ngram_size})")]
    InvalidConfigNgramSize { ngram_size: usize },

    #[error("invalid config: num_hashes must be >= 1 (got {num_hashes})")]
    InvalidConfigNumHashes { num_hashes: usize },

    #[error("unsupported signature version {version}; expected {}", SIGNATURE_VERSION)]
    InvalidConfigVersion { version: u32 },

    #[error("signature length mismatch: {left} vs {right}")]
    SignatureLengthMismatch { left: usize, right: usize },
}
