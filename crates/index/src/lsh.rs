//! Banded locality-sensitive hashing over MinHash signatures.
//!
//! A signature of length `H` is cut into `num_bands` bands of `rows_per_band`
//! values. Two samples become candidates when any band hashes to the same
//! bucket. Candidates are then re-ranked with the full-signature Jaccard
//! estimate, so the bucket hash only affects recall, never the reported score.
//!
//! For true similarity `s` the probability of becoming a candidate is
//! `1 - (1 - s^r)^b`, an S-curve whose steepest point sits near
//! `(1/b)^(1/r)`.

use hashbrown::{HashMap, HashSet};
use log::{debug, warn};
use perceptual::Signature;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::arena::{SampleArena, SampleKey};
use crate::IndexError;

/// Banding parameters. `num_bands * rows_per_band` may be smaller than
/// `num_hashes`; trailing signature values are then ignored for bucketing but
/// still used for re-ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LshConfig {
    pub num_bands: usize,
    pub rows_per_band: usize,
    pub num_hashes: usize,
    /// Bucket and match indeterminate (empty-text) signatures.
    #[serde(default)]
    pub match_empty_text: bool,
}

impl LshConfig {
    /// Validated constructor.
    pub fn new(num_bands: usize, rows_per_band: usize, num_hashes: usize) -> Result<Self, IndexError> {
        let cfg = Self {
            num_bands,
            rows_per_band,
            num_hashes,
            match_empty_text: false,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_empty_text_matching(mut self, enabled: bool) -> Self {
        self.match_empty_text = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.num_bands == 0 {
            return Err(IndexError::InvalidConfig("num_bands must be >= 1".into()));
        }
        if self.rows_per_band == 0 {
            return Err(IndexError::InvalidConfig("rows_per_band must be >= 1".into()));
        }
        if self.num_hashes == 0 {
            return Err(IndexError::InvalidConfig("num_hashes must be >= 1".into()));
        }
        let needed = self.num_bands.checked_mul(self.rows_per_band);
        match needed {
            Some(n) if n <= self.num_hashes => Ok(()),
            _ => Err(IndexError::InvalidConfig(format!(
                "num_bands * rows_per_band ({} * {}) exceeds num_hashes ({})",
                self.num_bands, self.rows_per_band, self.num_hashes
            ))),
        }
    }

    /// Probability that a pair with true Jaccard `similarity` shares at least
    /// one band bucket: `1 - (1 - s^r)^b`.
    pub fn candidate_probability(&self, similarity: f64) -> f64 {
        let s = similarity.clamp(0.0, 1.0);
        1.0 - (1.0 - s.powi(self.rows_per_band as i32)).powi(self.num_bands as i32)
    }

    /// Similarity at which the S-curve is steepest, `(1/b)^(1/r)`.
    pub fn approximate_threshold(&self) -> f64 {
        (1.0 / self.num_bands as f64).powf(1.0 / self.rows_per_band as f64)
    }
}

impl Default for LshConfig {
    fn default() -> Self {
        Self {
            num_bands: 16,
            rows_per_band: 4,
            num_hashes: 64,
            match_empty_text: false,
        }
    }
}

/// A re-ranked LSH hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LshMatch<'a> {
    pub sample_id: &'a str,
    pub similarity: f64,
}

/// Banded LSH index. Owns the full signature of every sample for re-ranking.
#[derive(Debug, Clone)]
pub struct LshIndex {
    config: LshConfig,
    arena: SampleArena,
    /// Indexed by `SampleKey::index()`.
    signatures: Vec<Signature>,
    /// One map per band: bucket key -> samples, in insertion order.
    bands: Vec<HashMap<u64, Vec<SampleKey>>>,
}

impl LshIndex {
    pub fn new(config: LshConfig) -> Result<Self, IndexError> {
        config.validate()?;
        Ok(Self {
            config,
            arena: SampleArena::new(),
            signatures: Vec::new(),
            bands: (0..config.num_bands).map(|_| HashMap::new()).collect(),
        })
    }

    pub fn config(&self) -> &LshConfig {
        &self.config
    }

    /// Insert `doc_id` with its signature.
    ///
    /// The first signature recorded for an id wins; later adds for the same id
    /// return `Ok(false)`. Indeterminate signatures are retained but only
    /// bucketed when `match_empty_text` is set.
    pub fn add(&mut self, doc_id: &str, signature: Signature) -> Result<bool, IndexError> {
        self.check_len(&signature)?;

        let (key, fresh) = self.arena.intern(doc_id)?;
        if !fresh {
            warn!("lsh index already holds sample {doc_id}; keeping the first signature");
            return Ok(false);
        }

        if signature.is_indeterminate() && !self.config.match_empty_text {
            debug!("lsh index storing indeterminate signature for {doc_id} without buckets");
        } else {
            let mut scratch = Vec::with_capacity(self.config.rows_per_band * 8);
            for (band, buckets) in self.bands.iter_mut().enumerate() {
                let bucket = band_key(&signature, band, self.config.rows_per_band, &mut scratch);
                buckets.entry(bucket).or_default().push(key);
            }
        }

        debug_assert_eq!(key.index(), self.signatures.len());
        self.signatures.push(signature);
        Ok(true)
    }

    /// Every sample sharing at least one band bucket with `signature`, in
    /// first-seen order. No re-ranking.
    pub fn candidates(&self, signature: &Signature) -> Result<Vec<&str>, IndexError> {
        Ok(self
            .candidate_keys(signature)?
            .into_iter()
            .filter_map(|k| self.arena.get(k))
            .collect())
    }

    /// Candidates re-ranked by estimated Jaccard, kept when
    /// `similarity >= threshold`, sorted by similarity descending then id
    /// ascending.
    pub fn query(&self, signature: &Signature, threshold: f64) -> Result<Vec<LshMatch<'_>>, IndexError> {
        let mut hits = Vec::new();
        for key in self.candidate_keys(signature)? {
            let (Some(sample_id), Some(stored)) = (self.arena.get(key), self.signatures.get(key.index()))
            else {
                continue;
            };
            let similarity = perceptual::jaccard(signature, stored)?;
            if similarity >= threshold {
                hits.push(LshMatch {
                    sample_id,
                    similarity,
                });
            }
        }

        hits.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.sample_id.cmp(b.sample_id))
        });
        Ok(hits)
    }

    /// Stored signature for `doc_id`.
    pub fn signature(&self, doc_id: &str) -> Option<&Signature> {
        self.arena
            .key_of(doc_id)
            .and_then(|k| self.signatures.get(k.index()))
    }

    /// Number of samples held (bucketed or not).
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    fn candidate_keys(&self, signature: &Signature) -> Result<Vec<SampleKey>, IndexError> {
        self.check_len(signature)?;
        if signature.is_indeterminate() && !self.config.match_empty_text {
            return Ok(Vec::new());
        }

        let mut seen: HashSet<SampleKey> = HashSet::new();
        let mut ordered = Vec::new();
        let mut scratch = Vec::with_capacity(self.config.rows_per_band * 8);
        for (band, buckets) in self.bands.iter().enumerate() {
            let bucket = band_key(signature, band, self.config.rows_per_band, &mut scratch);
            if let Some(keys) = buckets.get(&bucket) {
                for &key in keys {
                    if seen.insert(key) {
                        ordered.push(key);
                    }
                }
            }
        }
        Ok(ordered)
    }

    fn check_len(&self, signature: &Signature) -> Result<(), IndexError> {
        if signature.len() != self.config.num_hashes {
            return Err(IndexError::SignatureLength {
                expected: self.config.num_hashes,
                got: signature.len(),
            });
        }
        Ok(())
    }
}

/// xxh3 of the little-endian bytes of one band's rows.
#[inline]
fn band_key(signature: &Signature, band: usize, rows: usize, scratch: &mut Vec<u8>) -> u64 {
    let start = band * rows;
    scratch.clear();
    for value in &signature.as_slice()[start..start + rows] {
        scratch.extend_from_slice(&value.to_le_bytes());
    }
    xxh3_64(scratch)
}
