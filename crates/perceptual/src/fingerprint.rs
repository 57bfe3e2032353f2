//! Value types produced by the perceptual layer.
//!
//! A [`Signature`] is only meaningful next to the
//! [`PerceptualConfig`](crate::PerceptualConfig) that produced it; signatures
//! of different lengths are never compared.

use serde::{Deserialize, Serialize};

use crate::config::PerceptualError;

/// Deduplicated 64-bit base hashes of a text's word n-grams, sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NgramHashSet(Vec<u64>);

impl NgramHashSet {
    pub(crate) fn from_unsorted(mut hashes: Vec<u64>) -> Self {
        hashes.sort_unstable();
        hashes.dedup();
        Self(hashes)
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, hash: u64) -> bool {
        self.0.binary_search(&hash).is_ok()
    }
}

impl FromIterator<u64> for NgramHashSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self::from_unsorted(iter.into_iter().collect())
    }
}

/// Fixed-length MinHash signature.
///
/// All-zero is the sentinel for "no shingles": the text normalized to
/// nothing and its similarity to anything is indeterminate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(Vec<u64>);

impl Signature {
    pub fn new(values: Vec<u64>) -> Self {
        Self(values)
    }

    /// The indeterminate signature of length `len`.
    pub fn empty(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u64> {
        self.0
    }

    /// True for the all-zero sentinel.
    pub fn is_indeterminate(&self) -> bool {
        self.0.iter().all(|&v| v == 0)
    }

    /// Estimated Jaccard similarity, see [`jaccard`].
    pub fn jaccard(&self, other: &Signature) -> Result<f64, PerceptualError> {
        jaccard(self, other)
    }
}

impl AsRef<[u64]> for Signature {
    fn as_ref(&self) -> &[u64] {
        &self.0
    }
}

/// Fraction of positions where the two signatures agree.
///
/// This is an unbiased estimator of the Jaccard similarity of the underlying
/// shingle sets, with variance `J(1-J)/H`.
pub fn jaccard(a: &Signature, b: &Signature) -> Result<f64, PerceptualError> {
    if a.len() != b.len() {
        return Err(PerceptualError::SignatureLengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Ok(0.0);
    }
    let matching = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .filter(|(x, y)| x == y)
        .count();
    Ok(matching as f64 / a.len() as f64)
}
