use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use index::{IndexError, LshConfig};
use ingest::IngestError;
use perceptual::{PerceptualConfig, PerceptualError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a benchmark example overlaps the training data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Canonical text is byte-identical to at least one training sample.
    Exact,
    /// Estimated Jaccard similarity reached the near-duplicate threshold.
    Near,
}

/// Configuration for building a [`TrainingIndex`](crate::TrainingIndex) and
/// scanning benchmarks against it.
///
/// `ScanConfig` is serde-friendly so it can be embedded in higher-level
/// configs; every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
    /// Shingle size, signature length and hash seed.
    #[serde(default)]
    pub perceptual: PerceptualConfig,
    /// LSH bands `b`.
    #[serde(default = "ScanConfig::default_num_bands")]
    pub num_bands: usize,
    /// Rows per LSH band `r`. `b * r` must not exceed the signature length.
    #[serde(default = "ScanConfig::default_rows_per_band")]
    pub rows_per_band: usize,
    /// Minimum estimated Jaccard for a near match, in `[0, 1]`.
    #[serde(default = "ScanConfig::default_near_duplicate_threshold")]
    pub near_duplicate_threshold: f64,
    /// Maximum number of entries in each detail list of the report.
    #[serde(default = "ScanConfig::default_match_detail_cap")]
    pub match_detail_cap: usize,
    /// Training ids listed per near match, best first.
    #[serde(default = "ScanConfig::default_near_match_candidates")]
    pub near_match_candidates: usize,
    /// Let text that normalizes to nothing match other such text.
    #[serde(default)]
    pub match_empty_text: bool,
    /// Use the rayon pool for signature computation and scanning.
    #[serde(default = "ScanConfig::default_parallel")]
    pub parallel: bool,
    /// Manifest records per build batch.
    #[serde(default = "ScanConfig::default_build_batch_size")]
    pub build_batch_size: usize,
}

impl ScanConfig {
    pub(crate) fn default_num_bands() -> usize {
        16
    }

    pub(crate) fn default_rows_per_band() -> usize {
        4
    }

    pub(crate) fn default_near_duplicate_threshold() -> f64 {
        0.7
    }

    pub(crate) fn default_match_detail_cap() -> usize {
        100
    }

    pub(crate) fn default_near_match_candidates() -> usize {
        5
    }

    pub(crate) fn default_parallel() -> bool {
        true
    }

    pub(crate) fn default_build_batch_size() -> usize {
        ingest::DEFAULT_BATCH_SIZE
    }

    /// Banding parameters derived from this config.
    pub fn lsh_config(&self) -> LshConfig {
        LshConfig {
            num_bands: self.num_bands,
            rows_per_band: self.rows_per_band,
            num_hashes: self.perceptual.num_hashes,
            match_empty_text: self.match_empty_text,
        }
    }

    /// Validate the configuration. All failures are fatal at index
    /// construction.
    pub fn validate(&self) -> Result<(), ScanError> {
        self.perceptual
            .validate()
            .map_err(|e| ScanError::InvalidConfig(e.to_string()))?;
        self.lsh_config()
            .validate()
            .map_err(|e| ScanError::InvalidConfig(e.to_string()))?;
        if !(0.0..=1.0).contains(&self.near_duplicate_threshold) {
            return Err(ScanError::InvalidConfig(
                "near_duplicate_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.near_match_candidates == 0 {
            return Err(ScanError::InvalidConfig(
                "near_match_candidates must be greater than zero".into(),
            ));
        }
        if self.build_batch_size == 0 {
            return Err(ScanError::InvalidConfig(
                "build_batch_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            perceptual: PerceptualConfig::default(),
            num_bands: Self::default_num_bands(),
            rows_per_band: Self::default_rows_per_band(),
            near_duplicate_threshold: Self::default_near_duplicate_threshold(),
            match_detail_cap: Self::default_match_detail_cap(),
            near_match_candidates: Self::default_near_match_candidates(),
            match_empty_text: false,
            parallel: Self::default_parallel(),
            build_batch_size: Self::default_build_batch_size(),
        }
    }
}

/// A contaminated benchmark example.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContaminationMatch {
    pub example_id: String,
    /// Exact: every sample in the digest bucket, in manifest order.
    /// Near: the best candidates, highest similarity first.
    pub matched_samples: Vec<String>,
    pub match_type: MatchType,
    /// 1.0 for exact matches, the best estimated Jaccard for near matches.
    pub similarity: f64,
}

/// Per-example scan result, in benchmark order.
#[derive(Debug, Clone, PartialEq)]
pub enum ExampleOutcome {
    Contaminated(ContaminationMatch),
    Clean { example_id: String },
}

impl ExampleOutcome {
    pub fn example_id(&self) -> &str {
        match self {
            ExampleOutcome::Contaminated(m) => &m.example_id,
            ExampleOutcome::Clean { example_id } => example_id,
        }
    }

    pub fn match_type(&self) -> Option<MatchType> {
        match self {
            ExampleOutcome::Contaminated(m) => Some(m.match_type),
            ExampleOutcome::Clean { .. } => None,
        }
    }

    /// Match score; 0.0 for clean examples.
    pub fn similarity(&self) -> f64 {
        match self {
            ExampleOutcome::Contaminated(m) => m.similarity,
            ExampleOutcome::Clean { .. } => 0.0,
        }
    }
}

/// Counters collected while building a training index.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildStats {
    /// Non-blank manifest lines seen, malformed ones included.
    pub records_read: usize,
    /// Samples inserted into the indices.
    pub samples_indexed: usize,
    /// Lines skipped as malformed.
    pub malformed_records: usize,
    /// Well-formed samples skipped because they carry no text.
    pub skipped_without_text: usize,
    /// Indexed samples whose text normalized to nothing.
    pub empty_after_normalization: usize,
    /// Samples whose id had already been indexed.
    pub duplicate_sample_ids: usize,
}

impl BuildStats {
    /// Build warnings: malformed plus text-less records.
    pub fn warnings(&self) -> usize {
        self.malformed_records + self.skipped_without_text
    }
}

/// Aggregate result of scanning one benchmark.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContaminationReport {
    pub total_examples: usize,
    pub exact_matches: usize,
    pub near_matches: usize,
    pub clean: usize,
    /// `(exact_matches + near_matches) / total_examples`, 0 for an empty
    /// benchmark.
    pub contamination_rate: f64,
    /// Benchmark order, capped at `match_detail_cap`.
    pub exact_match_details: Vec<ContaminationMatch>,
    /// Highest similarity first, capped at `match_detail_cap`.
    pub near_match_details: Vec<ContaminationMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub build: BuildStats,
    #[serde(default)]
    pub warnings: usize,
}

impl ContaminationReport {
    /// Aggregate per-example outcomes.
    pub fn from_outcomes(outcomes: &[ExampleOutcome], detail_cap: usize, build: BuildStats) -> Self {
        let mut exact = Vec::new();
        let mut near = Vec::new();
        let mut clean = 0usize;

        for outcome in outcomes {
            match outcome {
                ExampleOutcome::Contaminated(m) if m.match_type == MatchType::Exact => {
                    exact.push(m.clone())
                }
                ExampleOutcome::Contaminated(m) => near.push(m.clone()),
                ExampleOutcome::Clean { .. } => clean += 1,
            }
        }

        let total = outcomes.len();
        let exact_matches = exact.len();
        let near_matches = near.len();
        let contamination_rate = if total == 0 {
            0.0
        } else {
            (exact_matches + near_matches) as f64 / total as f64
        };

        // Stable: ties keep benchmark order.
        near.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        near.truncate(detail_cap);
        exact.truncate(detail_cap);

        Self {
            total_examples: total,
            exact_matches,
            near_matches,
            clean,
            contamination_rate,
            exact_match_details: exact,
            near_match_details: near,
            benchmark: None,
            split: None,
            manifest: None,
            generated_at: Utc::now(),
            build,
            warnings: build.warnings(),
        }
    }

    pub fn with_benchmark(mut self, benchmark: impl Into<String>) -> Self {
        self.benchmark = Some(benchmark.into());
        self
    }

    pub fn with_split(mut self, split: impl Into<String>) -> Self {
        self.split = Some(split.into());
        self
    }

    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }

    /// Number of contaminated examples.
    pub fn contaminated(&self) -> usize {
        self.exact_matches + self.near_matches
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ScanError> {
        let path = path.as_ref();
        let write_err = |message: String| ScanError::ReportWrite {
            path: path.to_path_buf(),
            message,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        let body = serde_json::to_vec_pretty(self).map_err(|e| write_err(e.to_string()))?;
        fs::write(path, body).map_err(|e| write_err(e.to_string()))
    }
}

/// Errors produced by index building and scanning.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Invalid configuration; raised before any data is read.
    #[error("invalid scan config: {0}")]
    InvalidConfig(String),
    /// Fatal manifest or benchmark failure.
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),
    #[error("index error: {0}")]
    Index(#[from] IndexError),
    #[error("signature error: {0}")]
    Perceptual(#[from] PerceptualError),
    /// The cancellation flag was raised between examples.
    #[error("scan cancelled")]
    Cancelled,
    #[error("failed to write report to {}: {message}", .path.display())]
    ReportWrite { path: PathBuf, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn near(id: &str, similarity: f64) -> ExampleOutcome {
        ExampleOutcome::Contaminated(ContaminationMatch {
            example_id: id.into(),
            matched_samples: vec!["t".into()],
            match_type: MatchType::Near,
            similarity,
        })
    }

    fn exact(id: &str) -> ExampleOutcome {
        ExampleOutcome::Contaminated(ContaminationMatch {
            example_id: id.into(),
            matched_samples: vec!["t".into()],
            match_type: MatchType::Exact,
            similarity: 1.0,
        })
    }

    fn clean(id: &str) -> ExampleOutcome {
        ExampleOutcome::Clean {
            example_id: id.into(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = ScanConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.perceptual.ngram_size, 5);
        assert_eq!(cfg.perceptual.num_hashes, 64);
        assert_eq!(cfg.num_bands, 16);
        assert_eq!(cfg.rows_per_band, 4);
        assert_eq!(cfg.near_duplicate_threshold, 0.7);
        assert_eq!(cfg.match_detail_cap, 100);
    }

    #[test]
    fn banding_larger_than_signature_rejected() {
        let cfg = ScanConfig {
            num_bands: 20,
            ..ScanConfig::default()
        };
        let err = cfg.validate().expect_err("config should be invalid");
        match err {
            ScanError::InvalidConfig(msg) => assert!(msg.contains("exceeds"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        for threshold in [-0.1, 1.5, f64::NAN] {
            let cfg = ScanConfig {
                near_duplicate_threshold: threshold,
                ..ScanConfig::default()
            };
            assert!(matches!(cfg.validate(), Err(ScanError::InvalidConfig(_))));
        }
    }

    #[test]
    fn zero_hashes_rejected() {
        let cfg = ScanConfig {
            perceptual: PerceptualConfig::new().with_num_hashes(0),
            ..ScanConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ScanError::InvalidConfig(_))));
    }

    #[test]
    fn report_counts_and_rate() {
        let outcomes = vec![exact("e1"), near("n1", 0.8), clean("c1"), clean("c2")];
        let report = ContaminationReport::from_outcomes(&outcomes, 100, BuildStats::default());
        assert_eq!(report.total_examples, 4);
        assert_eq!(report.exact_matches, 1);
        assert_eq!(report.near_matches, 1);
        assert_eq!(report.clean, 2);
        assert_eq!(
            report.exact_matches + report.near_matches + report.clean,
            report.total_examples
        );
        assert!((report.contamination_rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_benchmark_has_zero_rate() {
        let report = ContaminationReport::from_outcomes(&[], 100, BuildStats::default());
        assert_eq!(report.total_examples, 0);
        assert_eq!(report.contamination_rate, 0.0);
    }

    #[test]
    fn near_details_sorted_and_capped() {
        let outcomes = vec![
            near("a", 0.71),
            near("b", 0.95),
            near("c", 0.80),
            near("d", 0.95),
        ];
        let report = ContaminationReport::from_outcomes(&outcomes, 3, BuildStats::default());
        let ids: Vec<&str> = report
            .near_match_details
            .iter()
            .map(|m| m.example_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "d", "c"]);
        assert_eq!(report.near_matches, 4);
    }

    #[test]
    fn warnings_come_from_build_stats() {
        let stats = BuildStats {
            malformed_records: 2,
            skipped_without_text: 3,
            ..BuildStats::default()
        };
        let report = ContaminationReport::from_outcomes(&[clean("x")], 10, stats);
        assert_eq!(report.warnings, 5);
        assert_eq!(report.build, stats);
    }

    #[test]
    fn report_json_shape() {
        let report = ContaminationReport::from_outcomes(&[exact("e1")], 10, BuildStats::default())
            .with_benchmark("demo");
        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["exact_match_details"][0]["match_type"], "exact");
        assert_eq!(value["exact_match_details"][0]["matched_samples"][0], "t");
        assert_eq!(value["benchmark"], "demo");
        assert!(value.get("split").is_none());
    }

    #[test]
    fn write_json_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/out/report.json");
        let report = ContaminationReport::from_outcomes(&[clean("x")], 10, BuildStats::default());
        report.write_json(&path).expect("write");
        let back: ContaminationReport =
            serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("parse");
        assert_eq!(back.total_examples, 1);
        assert_eq!(back.clean, 1);
    }
}
