use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use canonical::CanonicalText;
use index::{ExactIndex, LshIndex};
use ingest::{BenchmarkExample, BenchmarkSource, IngestError, ManifestReader, TrainingSample};
use perceptual::{compute_signature, PerceptualConfig, Signature};
use rayon::prelude::*;
use tracing::{debug, info, span, warn, Level};

use crate::metrics::metrics_recorder;
use crate::types::{
    BuildStats, ContaminationMatch, ContaminationReport, ExampleOutcome, MatchType, ScanConfig,
    ScanError,
};

/// A training sample reduced to what the indices store.
struct PreparedSample<'a> {
    sample_id: &'a str,
    canonical: CanonicalText,
    signature: Signature,
}

fn prepare<'a>(sample: &'a TrainingSample, cfg: &PerceptualConfig) -> Option<PreparedSample<'a>> {
    let text = sample.indexable_text()?;
    let canonical = CanonicalText::new(text);
    let signature = compute_signature(&canonical, cfg);
    Some(PreparedSample {
        sample_id: &sample.sample_id,
        canonical,
        signature,
    })
}

/// Incrementally builds a [`TrainingIndex`].
///
/// Samples can be fed one at a time, in batches, or straight from a
/// manifest. Batches compute canonical text and signatures on the rayon pool
/// when `ScanConfig::parallel` is set; insertion is always sequential, in
/// input order, so the resulting index is identical either way.
pub struct IndexBuilder {
    config: ScanConfig,
    exact: ExactIndex,
    lsh: LshIndex,
    stats: BuildStats,
    manifest: Option<String>,
    started: Instant,
}

impl IndexBuilder {
    /// Validate `config` and create an empty builder.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        let lsh = LshIndex::new(config.lsh_config())?;
        let exact = ExactIndex::new().with_empty_text_matching(config.match_empty_text);
        Ok(Self {
            config,
            exact,
            lsh,
            stats: BuildStats::default(),
            manifest: None,
            started: Instant::now(),
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Index one sample. Returns `false` when the sample was skipped for
    /// lack of text or its id was already indexed.
    pub fn add_sample(&mut self, sample: &TrainingSample) -> Result<bool, ScanError> {
        let prepared = prepare(sample, &self.config.perceptual);
        self.insert(prepared)
    }

    /// Index a batch of samples, returning how many were newly indexed.
    pub fn add_batch(&mut self, samples: &[TrainingSample]) -> Result<usize, ScanError> {
        let cfg = &self.config.perceptual;
        let prepared: Vec<Option<PreparedSample<'_>>> = if self.config.parallel {
            samples.par_iter().map(|s| prepare(s, cfg)).collect()
        } else {
            samples.iter().map(|s| prepare(s, cfg)).collect()
        };

        let mut added = 0;
        for p in prepared {
            if self.insert(p)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Count and log a malformed manifest record.
    pub fn record_rejected(&mut self, err: &IngestError) {
        self.stats.records_read += 1;
        self.stats.malformed_records += 1;
        let path = match err {
            IngestError::ManifestParse { path, .. } | IngestError::ManifestIo { path, .. } => {
                path.display().to_string()
            }
            _ => String::new(),
        };
        warn!(
            path = %path,
            line = err.line().unwrap_or_default(),
            error = %err,
            "manifest_record_skipped"
        );
    }

    /// Stream a manifest into the index. Malformed records are counted and
    /// skipped; an I/O failure aborts the build.
    pub fn ingest_manifest(&mut self, reader: ManifestReader) -> Result<(), ScanError> {
        let label = reader.path().display().to_string();
        for batch in reader.batches(self.config.build_batch_size) {
            let batch = batch?;
            for err in &batch.rejected {
                self.record_rejected(err);
            }
            self.add_batch(&batch.samples)?;
            debug!(
                manifest = %label,
                records_read = self.stats.records_read,
                samples_indexed = self.stats.samples_indexed,
                "manifest_batch_indexed"
            );
        }
        self.manifest.get_or_insert(label);
        Ok(())
    }

    fn insert(&mut self, prepared: Option<PreparedSample<'_>>) -> Result<bool, ScanError> {
        self.stats.records_read += 1;
        let Some(p) = prepared else {
            self.stats.skipped_without_text += 1;
            return Ok(false);
        };
        if p.canonical.is_empty() {
            self.stats.empty_after_normalization += 1;
        }
        // First record for an id wins in both indices.
        if !self.lsh.add(p.sample_id, p.signature)? {
            self.stats.duplicate_sample_ids += 1;
            return Ok(false);
        }
        self.exact.add_canonical(p.sample_id, &p.canonical)?;
        self.stats.samples_indexed += 1;
        Ok(true)
    }

    /// Finish the build. The index is read-only from here on.
    pub fn build(self) -> TrainingIndex {
        let latency = self.started.elapsed();
        info!(
            records_read = self.stats.records_read,
            samples_indexed = self.stats.samples_indexed,
            malformed_records = self.stats.malformed_records,
            skipped_without_text = self.stats.skipped_without_text,
            distinct_digests = self.exact.len(),
            elapsed_micros = latency.as_micros() as u64,
            "index_build_complete"
        );
        if let Some(metrics) = metrics_recorder() {
            metrics.record_build(&self.stats, latency);
        }
        TrainingIndex {
            config: self.config,
            exact: self.exact,
            lsh: self.lsh,
            stats: self.stats,
            manifest: self.manifest,
        }
    }
}

/// Immutable exact and near-duplicate indices over a training corpus.
///
/// Read-only after [`IndexBuilder::build`]; any number of scans may run
/// against it concurrently.
#[derive(Debug, Clone)]
pub struct TrainingIndex {
    config: ScanConfig,
    exact: ExactIndex,
    lsh: LshIndex,
    stats: BuildStats,
    manifest: Option<String>,
}

impl TrainingIndex {
    /// Build an index from a manifest file.
    pub fn from_manifest(path: impl AsRef<Path>, config: ScanConfig) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let span = span!(Level::INFO, "index.build", manifest = %path.display());
        let _guard = span.enter();

        let mut builder = IndexBuilder::new(config)?;
        let reader = ManifestReader::open(path)?;
        builder.ingest_manifest(reader)?;
        Ok(builder.build())
    }

    /// Build an index from samples already in memory.
    pub fn from_samples(samples: &[TrainingSample], config: ScanConfig) -> Result<Self, ScanError> {
        let mut builder = IndexBuilder::new(config)?;
        builder.add_batch(samples)?;
        Ok(builder.build())
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Number of indexed samples.
    pub fn len(&self) -> usize {
        self.lsh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lsh.is_empty()
    }

    pub fn exact_index(&self) -> &ExactIndex {
        &self.exact
    }

    pub fn lsh_index(&self) -> &LshIndex {
        &self.lsh
    }

    /// Classify one example: exact match first, then near-duplicate
    /// candidates re-ranked by estimated Jaccard.
    pub fn classify(&self, example: &BenchmarkExample) -> Result<ExampleOutcome, ScanError> {
        let canonical = CanonicalText::new(&example.text);

        let exact = self.exact.find_canonical(&canonical);
        if !exact.is_empty() {
            return Ok(ExampleOutcome::Contaminated(ContaminationMatch {
                example_id: example.example_id.clone(),
                matched_samples: exact.into_iter().map(str::to_owned).collect(),
                match_type: MatchType::Exact,
                similarity: 1.0,
            }));
        }

        let signature = compute_signature(&canonical, &self.config.perceptual);
        let hits = self
            .lsh
            .query(&signature, self.config.near_duplicate_threshold)?;
        let Some(best) = hits.first() else {
            return Ok(ExampleOutcome::Clean {
                example_id: example.example_id.clone(),
            });
        };
        Ok(ExampleOutcome::Contaminated(ContaminationMatch {
            example_id: example.example_id.clone(),
            similarity: best.similarity,
            matched_samples: hits
                .iter()
                .take(self.config.near_match_candidates)
                .map(|hit| hit.sample_id.to_owned())
                .collect(),
            match_type: MatchType::Near,
        }))
    }

    fn classify_checked(
        &self,
        example: &BenchmarkExample,
        cancel: Option<&AtomicBool>,
    ) -> Result<ExampleOutcome, ScanError> {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Err(ScanError::Cancelled);
        }
        let start = Instant::now();
        let outcome = self.classify(example)?;
        if let Some(metrics) = metrics_recorder() {
            metrics.record_example(outcome.match_type(), start.elapsed());
        }
        Ok(outcome)
    }

    /// Per-example outcomes in benchmark order. Results do not depend on
    /// `ScanConfig::parallel`.
    pub fn scan_examples(
        &self,
        examples: &[BenchmarkExample],
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<ExampleOutcome>, ScanError> {
        if self.config.parallel {
            examples
                .par_iter()
                .map(|ex| self.classify_checked(ex, cancel))
                .collect()
        } else {
            examples
                .iter()
                .map(|ex| self.classify_checked(ex, cancel))
                .collect()
        }
    }

    /// Scan a benchmark and aggregate the report.
    pub fn scan(&self, examples: &[BenchmarkExample]) -> Result<ContaminationReport, ScanError> {
        self.scan_inner(examples, None)
    }

    /// Like [`scan`](Self::scan), but stops with [`ScanError::Cancelled`]
    /// once `cancel` is raised. No partial report is produced.
    pub fn scan_with_cancel(
        &self,
        examples: &[BenchmarkExample],
        cancel: &AtomicBool,
    ) -> Result<ContaminationReport, ScanError> {
        self.scan_inner(examples, Some(cancel))
    }

    /// Load a benchmark source and scan it. The report carries the source
    /// name.
    pub fn scan_source(&self, source: &BenchmarkSource) -> Result<ContaminationReport, ScanError> {
        let examples = source.load()?;
        Ok(self.scan(&examples)?.with_benchmark(source.name()))
    }

    fn scan_inner(
        &self,
        examples: &[BenchmarkExample],
        cancel: Option<&AtomicBool>,
    ) -> Result<ContaminationReport, ScanError> {
        let span = span!(Level::INFO, "scan", examples = examples.len());
        let _guard = span.enter();
        let start = Instant::now();

        let outcomes = self.scan_examples(examples, cancel)?;
        let mut report =
            ContaminationReport::from_outcomes(&outcomes, self.config.match_detail_cap, self.stats);
        if let Some(manifest) = &self.manifest {
            report = report.with_manifest(manifest.clone());
        }

        info!(
            total = report.total_examples,
            exact = report.exact_matches,
            near = report.near_matches,
            clean = report.clean,
            contamination_rate = report.contamination_rate,
            elapsed_micros = start.elapsed().as_micros() as u64,
            "scan_complete"
        );
        Ok(report)
    }
}
