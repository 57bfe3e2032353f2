//! # Contamination scanning (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` ties the lower crates together. It builds a [`TrainingIndex`]
//! (exact SHA-256 buckets plus a banded MinHash LSH index) from training
//! samples, then classifies every benchmark example as `exact`, `near` or
//! clean and aggregates the result into a [`ContaminationReport`].
//!
//! ## Core Types
//!
//! - [`ScanConfig`]: shingle size, signature length, LSH banding, threshold
//!   and report caps.
//! - [`IndexBuilder`]: incremental construction from samples, batches or a
//!   manifest; malformed manifest records are counted, not fatal.
//! - [`TrainingIndex`]: the read-only index. `scan`, `scan_source` and
//!   `scan_with_cancel` may run concurrently.
//! - [`ContaminationReport`]: counts, rate, capped detail lists, build stats.
//! - [`ContaminationLevel`] / [`ContaminationTag`]: per-example risk tags
//!   for filtering predictions.
//!
//! ## Classification
//!
//! An example whose canonical text digest matches a training sample is an
//! exact match and skips the near-duplicate check. Otherwise its MinHash
//! signature is looked up in the LSH index; candidates are re-ranked by
//! estimated Jaccard and the example is a near match when the best one
//! reaches `near_duplicate_threshold`.
//!
//! ## Example Usage
//!
//! ```
//! use ingest::{BenchmarkExample, TrainingSample};
//! use matcher::{ScanConfig, TrainingIndex};
//!
//! let samples = vec![TrainingSample::from_text("t1", "Explain the water cycle.")];
//! let index = TrainingIndex::from_samples(&samples, ScanConfig::default()).unwrap();
//!
//! let report = index
//!     .scan(&[
//!         BenchmarkExample::new("e1", "Explain the water cycle."),
//!         BenchmarkExample::new("e2", "Describe the theory of relativity."),
//!     ])
//!     .unwrap();
//!
//! assert_eq!(report.exact_matches, 1);
//! assert_eq!(report.clean, 1);
//! assert_eq!(report.contamination_rate, 0.5);
//! ```

mod engine;
mod metrics;
mod tags;
mod types;

pub use crate::engine::{IndexBuilder, TrainingIndex};
pub use crate::metrics::{set_scan_metrics, ScanMetrics};
pub use crate::tags::{
    filter_by_contamination, level_for_score, tag_outcomes, tag_report, ContaminationLevel,
    ContaminationTag,
};
pub use crate::types::{
    BuildStats, ContaminationMatch, ContaminationReport, ExampleOutcome, MatchType, ScanConfig,
    ScanError,
};
