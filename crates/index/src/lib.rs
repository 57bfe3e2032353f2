//! # Training-side indices
//!
//! Two in-memory indices built once per training manifest and queried once per
//! benchmark example:
//!
//! - [`ExactIndex`]: SHA-256 of canonical text to the sample ids that produced
//!   it. A lookup either hits a bucket or returns nothing.
//! - [`LshIndex`]: MinHash signatures banded into buckets for sub-linear
//!   near-duplicate retrieval, re-ranked by the Jaccard estimate.
//!
//! Both index sample ids through a [`SampleArena`] so buckets hold small
//! integer keys. Neither index has interior mutability: build with `&mut`,
//! then share `&` across threads.
//!
//! ## Example Usage
//!
//! ```
//! use canonical::CanonicalText;
//! use index::{ExactIndex, LshConfig, LshIndex};
//! use perceptual::{compute_signature, PerceptualConfig};
//!
//! let mut exact = ExactIndex::new();
//! exact.add("train-1", "The water cycle.").unwrap();
//! assert_eq!(exact.find_exact("the WATER cycle"), vec!["train-1"]);
//!
//! let pcfg = PerceptualConfig::default();
//! let mut lsh = LshIndex::new(LshConfig::default()).unwrap();
//! let text = CanonicalText::new("water evaporates condenses and falls as rain again");
//! lsh.add("train-1", compute_signature(&text, &pcfg)).unwrap();
//!
//! let hits = lsh.query(&compute_signature(&text, &pcfg), 0.7).unwrap();
//! assert_eq!(hits[0].sample_id, "train-1");
//! ```

mod arena;
mod exact;
mod lsh;

use perceptual::PerceptualError;
use thiserror::Error;

pub use crate::arena::{SampleArena, SampleKey};
pub use crate::exact::{ExactFingerprint, ExactIndex};
pub use crate::lsh::{LshConfig, LshIndex, LshMatch};

/// Errors produced by index construction and queries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("invalid index config: {0}")]
    InvalidConfig(String),
    #[error("signature length {got} does not match index length {expected}")]
    SignatureLength { expected: usize, got: usize },
    #[error("sample arena is full ({0} samples)")]
    ArenaFull(usize),
    #[error("signature error: {0}")]
    Signature(#[from] PerceptualError),
}
