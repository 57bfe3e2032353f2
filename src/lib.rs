//! Workspace umbrella crate for benchmark contamination detection.
//!
//! This crate re-exports the pipeline stages (normalization, signatures,
//! indices, ingestion, scanning) and adds a YAML-driven entry point,
//! [`run_contamination_scan`], that builds a training index from a manifest,
//! scans one benchmark and optionally writes the report to disk.

pub mod config;

pub use canonical::{digest_bytes, hash_text, normalize, CanonicalText, Digest256};
pub use index::{ExactFingerprint, ExactIndex, IndexError, LshConfig, LshIndex, LshMatch};
pub use ingest::{
    BenchmarkExample, BenchmarkSource, IngestError, ManifestBatch, ManifestFormat, ManifestReader,
    Modality, TrainingSample,
};
pub use matcher::{
    filter_by_contamination, level_for_score, set_scan_metrics, tag_outcomes, tag_report,
    BuildStats, ContaminationLevel, ContaminationMatch, ContaminationReport, ContaminationTag,
    ExampleOutcome, IndexBuilder, MatchType, ScanConfig, ScanError, ScanMetrics, TrainingIndex,
};
pub use perceptual::{
    compute_signature, jaccard, shingles, PerceptualConfig, PerceptualError, Signature,
};

pub use crate::config::{ConfigLoadError, DecontamConfig};

use tracing::{info, span, Level};

/// Build the training index named by `config`, scan its benchmark and return
/// the report.
///
/// The report carries the benchmark name, the manifest path and, when set,
/// the split. When `config.output` is set the report is also written there
/// as pretty JSON.
pub fn run_contamination_scan(config: &DecontamConfig) -> Result<ContaminationReport, ScanError> {
    let span = span!(
        Level::INFO,
        "decontam.run",
        name = config.name.as_deref().unwrap_or(""),
        benchmark = %config.benchmark.name()
    );
    let _guard = span.enter();

    let index = TrainingIndex::from_manifest(&config.manifest, config.scan.clone())?;
    let mut report = index.scan_source(&config.benchmark)?;
    if let Some(split) = &config.split {
        report = report.with_split(split.clone());
    }

    if let Some(output) = &config.output {
        report.write_json(output)?;
        info!(path = %output.display(), "report_written");
    }
    Ok(report)
}
