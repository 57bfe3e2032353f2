//! Word n-gram shingling over canonical text.
//!
//! Canonical text is single-space separated, so a window of `k` consecutive
//! words is always a contiguous slice of the text. Shingles are produced as
//! slices and hashed in place; only [`shingles`] allocates strings.

use std::collections::BTreeSet;

use canonical::CanonicalText;
use xxhash_rust::xxh3::xxh3_64;

use crate::fingerprint::NgramHashSet;
use crate::minhash::{mix_u64, splitmix64};

/// Set of word n-grams of `text`.
///
/// - fewer than `k` words: one element, the whole canonical text
/// - empty canonical text: empty set
pub fn shingles(text: &CanonicalText, k: usize) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for_each_shingle(text.as_str(), k, |s| {
        out.insert(s.to_owned());
    });
    out
}

/// 64-bit base hashes of the shingles of `text`, deduplicated.
pub fn ngram_hashes(text: &CanonicalText, k: usize) -> NgramHashSet {
    let mut hashes = Vec::new();
    for_each_shingle(text.as_str(), k, |s| hashes.push(shingle_hash(s)));
    NgramHashSet::from_unsorted(hashes)
}

/// Base hash of one shingle. The MinHash permutations are derived from it.
#[inline]
pub fn shingle_hash(shingle: &str) -> u64 {
    xxh3_64(shingle.as_bytes())
}

/// Hash of `shingle` under the permutation selected by `seed`.
///
/// Different seeds behave as independent hash functions over the same
/// shingle universe.
#[inline]
pub fn hash_shingle(shingle: &str, seed: u64) -> u64 {
    mix_u64(shingle_hash(shingle), splitmix64(seed))
}

/// Calls `f` with every k-word window of `canonical`, in order. Duplicates
/// are passed through; callers dedupe.
fn for_each_shingle<'a>(canonical: &'a str, k: usize, mut f: impl FnMut(&'a str)) {
    if canonical.is_empty() {
        return;
    }
    let k = k.max(1);

    // Byte offset where each word starts; a word ends one byte before the
    // next start (the separating space) or at the end of the text.
    let starts: Vec<usize> = std::iter::once(0)
        .chain(
            canonical
                .char_indices()
                .filter(|&(_, c)| c == ' ')
                .map(|(i, _)| i + 1),
        )
        .collect();

    let words = starts.len();
    if words < k {
        f(canonical);
        return;
    }

    for first in 0..=(words - k) {
        let start = starts[first];
        let end = match starts.get(first + k) {
            Some(&next) => next - 1,
            None => canonical.len(),
        };
        f(&canonical[start..end]);
    }
}
