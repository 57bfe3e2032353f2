//! MinHash signatures over n-gram hash sets.
//!
//! Slot `j` of a signature is the minimum, over all shingles, of the shingle
//! hash under the `j`-th permutation. Permutation keys are derived from a
//! single 64-bit seed, so a signature is fully determined by the canonical
//! text and the [`PerceptualConfig`].

use canonical::CanonicalText;
use rayon::prelude::*;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::config::PerceptualConfig;
use crate::fingerprint::Signature;
use crate::shingles::ngram_hashes;

/// Golden-ratio step between consecutive permutation seeds.
const SLOT_STEP: u64 = 0x9E37_79B9_7F4A_7C15;

/// MinHash signature of `text` with `cfg.num_hashes` slots.
///
/// Text that normalizes to nothing has no shingles and yields the
/// indeterminate all-zero signature.
pub fn compute_signature(text: &CanonicalText, cfg: &PerceptualConfig) -> Signature {
    let hashes = ngram_hashes(text, cfg.ngram_size);
    Signature::new(minhash_signature(hashes.as_slice(), cfg.num_hashes, cfg))
}

/// Compute `m` MinHash slots over `unique_shingles` (parallel if
/// `cfg.use_parallel`).
///
/// An empty input gives `m` zeros.
pub fn minhash_signature(unique_shingles: &[u64], m: usize, cfg: &PerceptualConfig) -> Vec<u64> {
    if m == 0 {
        return Vec::new();
    }

    if unique_shingles.is_empty() {
        return vec![0; m];
    }

    let mut result = Vec::with_capacity(m);

    if cfg.use_parallel {
        (0..m)
            .into_par_iter()
            .map(|j| compute_slot(unique_shingles, j, cfg.seed))
            .collect_into_vec(&mut result);
    } else {
        result.extend((0..m).map(|j| compute_slot(unique_shingles, j, cfg.seed)));
    }

    result
}

/// Seed of the `j`-th permutation. `hash_shingle(s, slot_seed(seed, j))`
/// is the value slot `j` minimizes over.
#[inline]
pub fn slot_seed(seed: u64, j: usize) -> u64 {
    seed.wrapping_add((j as u64).wrapping_mul(SLOT_STEP))
}

/// Computes a single slot in the MinHash signature.
#[inline]
pub(crate) fn compute_slot(unique_shingles: &[u64], j: usize, seed: u64) -> u64 {
    let key = splitmix64(slot_seed(seed, j));
    unique_shingles
        .iter()
        .map(|&val| mix_u64(val, key))
        .min()
        .unwrap_or(0)
}

/// Re-hash `x` under `key`, followed by a murmur3 finalizer.
#[inline]
pub(crate) fn mix_u64(x: u64, key: u64) -> u64 {
    let mut h = xxh3_64_with_seed(&x.to_le_bytes(), key);
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51afd7ed558ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ceb9fe1a85ec53);
    h ^ (h >> 33)
}

#[inline]
pub(crate) fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::jaccard;
    use crate::shingles::{hash_shingle, shingles};

    fn cfg_with_hashes(num_hashes: usize) -> PerceptualConfig {
        PerceptualConfig::new().with_num_hashes(num_hashes)
    }

    // ==================== Signature Tests ====================

    #[test]
    fn minhash_signature_m_zero_returns_empty() {
        let sig = minhash_signature(&[1, 2, 3], 0, &PerceptualConfig::default());
        assert!(sig.is_empty());
    }

    #[test]
    fn minhash_signature_empty_shingles_returns_zeros() {
        let sig = minhash_signature(&[], 16, &PerceptualConfig::default());
        assert_eq!(sig, vec![0; 16]);
    }

    #[test]
    fn compute_signature_has_configured_length() {
        let text = CanonicalText::new("the quick brown fox jumps over the lazy dog");
        for h in [1, 16, 64, 256] {
            let sig = compute_signature(&text, &cfg_with_hashes(h));
            assert_eq!(sig.len(), h);
            assert!(!sig.is_indeterminate());
        }
    }

    #[test]
    fn compute_signature_of_empty_text_is_indeterminate() {
        let sig = compute_signature(&CanonicalText::new("  ...  "), &cfg_with_hashes(32));
        assert_eq!(sig.len(), 32);
        assert!(sig.is_indeterminate());
    }

    #[test]
    fn slots_are_minimum_of_seeded_shingle_hashes() {
        let cfg = PerceptualConfig::new().with_ngram_size(3).with_num_hashes(8);
        let text = CanonicalText::new("water evaporates from the ocean surface");
        let sig = compute_signature(&text, &cfg);
        let set = shingles(&text, cfg.ngram_size);

        for (j, &slot) in sig.as_slice().iter().enumerate() {
            let expected = set
                .iter()
                .map(|s| hash_shingle(s, slot_seed(cfg.seed, j)))
                .min()
                .expect("non-empty shingle set");
            assert_eq!(slot, expected, "slot {j}");
        }
    }

    #[test]
    fn self_similarity_is_one() {
        let text = CanonicalText::new("Rain falls, rivers flow, and the sea evaporates again.");
        let cfg = PerceptualConfig::default();
        let a = compute_signature(&text, &cfg);
        let b = compute_signature(&text, &cfg);
        assert_eq!(jaccard(&a, &b), Ok(1.0));
    }

    #[test]
    fn minhash_signature_different_seeds() {
        let shingles = vec![1u64, 2, 3, 4, 5];
        let sig1 = minhash_signature(&shingles, 16, &PerceptualConfig::new().with_seed(12345));
        let sig2 = minhash_signature(&shingles, 16, &PerceptualConfig::new().with_seed(54321));
        assert_ne!(sig1, sig2);
    }

    #[test]
    fn minhash_signature_parallel_equals_sequential() {
        let shingles: Vec<u64> = (1..=64).collect();
        let seq = minhash_signature(&shingles, 128, &PerceptualConfig::new().with_parallel(false));
        let par = minhash_signature(&shingles, 128, &PerceptualConfig::new().with_parallel(true));
        assert_eq!(seq, par);
    }

    #[test]
    fn estimate_tracks_true_jaccard() {
        // |A ∩ B| = 100, |A ∪ B| = 300 -> J = 1/3
        let a: Vec<u64> = (0..200).collect();
        let b: Vec<u64> = (100..300).collect();
        let cfg = cfg_with_hashes(1024);
        let sa = Signature::new(minhash_signature(&a, cfg.num_hashes, &cfg));
        let sb = Signature::new(minhash_signature(&b, cfg.num_hashes, &cfg));
        let est = jaccard(&sa, &sb).expect("same length");
        assert!((est - 1.0 / 3.0).abs() < 0.08, "estimate {est}");
    }

    #[test]
    fn estimator_variance_shrinks_with_more_hashes() {
        let a: Vec<u64> = (0..200).collect();
        let b: Vec<u64> = (100..300).collect();
        let truth = 1.0 / 3.0;
        let mut rng = fastrand::Rng::with_seed(0x5EED);

        let mse = |h: usize, rng: &mut fastrand::Rng| {
            let trials = 100;
            let mut total = 0.0;
            for _ in 0..trials {
                let cfg = cfg_with_hashes(h).with_seed(rng.u64(..));
                let sa = Signature::new(minhash_signature(&a, h, &cfg));
                let sb = Signature::new(minhash_signature(&b, h, &cfg));
                let err = jaccard(&sa, &sb).expect("same length") - truth;
                total += err * err;
            }
            total / trials as f64
        };

        let mse_16 = mse(16, &mut rng);
        let mse_256 = mse(256, &mut rng);
        assert!(
            mse_256 < mse_16,
            "expected lower error at H=256 ({mse_256}) than at H=16 ({mse_16})"
        );
    }

    // ==================== Hash Helper Tests ====================

    #[test]
    fn compute_slot_different_j_produce_different_values() {
        let shingles = vec![100u64, 200, 300];
        let slot0 = compute_slot(&shingles, 0, 42);
        let slot1 = compute_slot(&shingles, 1, 42);
        assert_ne!(slot0, slot1);
    }

    #[test]
    fn mix_u64_different_keys() {
        assert_ne!(mix_u64(12345, 1), mix_u64(12345, 2));
        assert_eq!(mix_u64(12345, 1), mix_u64(12345, 1));
    }

    #[test]
    fn splitmix64_well_distributed() {
        let values: Vec<u64> = (0..1000).map(splitmix64).collect();
        let mut unique = values.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), values.len());
    }
}
