//! Exact-duplicate index: SHA-256 of canonical text to sample ids.

use canonical::{CanonicalText, Digest256};
use hashbrown::HashMap;
use log::debug;
use serde::Serialize;

use crate::arena::{SampleArena, SampleKey};
use crate::IndexError;

/// One digest bucket, resolved to owned ids. Buckets keep insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExactFingerprint {
    pub hash: Digest256,
    pub sample_ids: Vec<String>,
}

/// Maps canonical-text digests to the samples that produced them.
///
/// Buckets are append-only. Re-adding a sample id to a bucket that already
/// holds it is a no-op. Text that normalizes to nothing is not indexed unless
/// `match_empty_text` is set, so an empty benchmark example never matches an
/// empty training record by accident.
#[derive(Debug, Default, Clone)]
pub struct ExactIndex {
    arena: SampleArena,
    buckets: HashMap<Digest256, Vec<SampleKey>>,
    match_empty_text: bool,
}

impl ExactIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opt in to indexing and matching empty canonical text.
    pub fn with_empty_text_matching(mut self, enabled: bool) -> Self {
        self.match_empty_text = enabled;
        self
    }

    /// Normalize `text` and record `sample_id` under its digest.
    ///
    /// Returns `false` when nothing was recorded (empty canonical text, or the
    /// sample already sits in that bucket).
    pub fn add(&mut self, sample_id: &str, text: &str) -> Result<bool, IndexError> {
        self.add_canonical(sample_id, &CanonicalText::new(text))
    }

    /// Same as [`add`](Self::add) for text that is already canonical.
    pub fn add_canonical(
        &mut self,
        sample_id: &str,
        canonical: &CanonicalText,
    ) -> Result<bool, IndexError> {
        if canonical.is_empty() && !self.match_empty_text {
            debug!("exact index skipping empty canonical text for sample {sample_id}");
            return Ok(false);
        }
        self.add_digest(sample_id, canonical.digest())
    }

    /// Record `sample_id` under a precomputed digest.
    pub fn add_digest(&mut self, sample_id: &str, digest: Digest256) -> Result<bool, IndexError> {
        let (key, fresh) = self.arena.intern(sample_id)?;
        let bucket = self.buckets.entry(digest).or_default();
        // A freshly interned id cannot already be in any bucket.
        if !fresh && bucket.contains(&key) {
            return Ok(false);
        }
        bucket.push(key);
        Ok(true)
    }

    /// Sample ids whose canonical text equals the canonical form of `text`.
    /// A miss is an empty vector.
    pub fn find_exact(&self, text: &str) -> Vec<&str> {
        self.find_canonical(&CanonicalText::new(text))
    }

    pub fn find_canonical(&self, canonical: &CanonicalText) -> Vec<&str> {
        if canonical.is_empty() && !self.match_empty_text {
            return Vec::new();
        }
        self.find_digest(&canonical.digest())
    }

    pub fn find_digest(&self, digest: &Digest256) -> Vec<&str> {
        self.buckets
            .get(digest)
            .map(|keys| keys.iter().filter_map(|&k| self.arena.get(k)).collect())
            .unwrap_or_default()
    }

    pub fn fingerprint(&self, digest: &Digest256) -> Option<ExactFingerprint> {
        let keys = self.buckets.get(digest)?;
        Some(ExactFingerprint {
            hash: *digest,
            sample_ids: keys
                .iter()
                .filter_map(|&k| self.arena.get(k))
                .map(str::to_owned)
                .collect(),
        })
    }

    /// Number of distinct digests.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of distinct sample ids recorded.
    pub fn num_samples(&self) -> usize {
        self.arena.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_roundtrip_through_normalization() {
        let mut index = ExactIndex::new();
        assert!(index.add("s1", "The Water Cycle.").expect("add"));

        assert_eq!(index.find_exact("the water cycle"), vec!["s1"]);
        assert_eq!(index.find_exact("  THE   water,  cycle!! "), vec!["s1"]);
        assert!(index.find_exact("the water cycles").is_empty());
    }

    #[test]
    fn bucket_keeps_insertion_order_and_dedupes() {
        let mut index = ExactIndex::new();
        index.add("b", "same text").expect("add");
        index.add("a", "Same, text!").expect("add");
        assert!(!index.add("b", "SAME TEXT").expect("add"));

        assert_eq!(index.find_exact("same text"), vec!["b", "a"]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.num_samples(), 2);
    }

    #[test]
    fn sample_can_live_in_several_buckets() {
        let mut index = ExactIndex::new();
        index.add("s", "first text").expect("add");
        index.add("s", "second text").expect("add");
        assert_eq!(index.find_exact("first text"), vec!["s"]);
        assert_eq!(index.find_exact("second text"), vec!["s"]);
    }

    #[test]
    fn empty_text_is_not_indexed_by_default() {
        let mut index = ExactIndex::new();
        assert!(!index.add("empty", "  ?!  ").expect("add"));
        assert!(index.is_empty());
        assert!(index.find_exact("").is_empty());
    }

    #[test]
    fn empty_text_matches_when_opted_in() {
        let mut index = ExactIndex::new().with_empty_text_matching(true);
        assert!(index.add("empty", "...").expect("add"));
        assert_eq!(index.find_exact(""), vec!["empty"]);
    }

    #[test]
    fn fingerprint_exposes_hash_and_ids() {
        let mut index = ExactIndex::new();
        index.add("s1", "hello world").expect("add");
        let digest = CanonicalText::new("hello world").digest();
        let fp = index.fingerprint(&digest).expect("bucket exists");
        assert_eq!(fp.hash, digest);
        assert_eq!(fp.sample_ids, vec!["s1".to_string()]);
        assert!(index.fingerprint(&CanonicalText::new("nope").digest()).is_none());
    }
}
