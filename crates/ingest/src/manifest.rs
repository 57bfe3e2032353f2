//! Streaming reader for training manifests.
//!
//! Supported layouts, chosen by file extension:
//!
//! | Extension | Reader |
//! |-----------|--------|
//! | `.jsonl`, `.json`, `.ndjson` | plain lines |
//! | `.gz` (e.g. `.jsonl.gz`) | gzip, multi-member |
//! | `.zst` (e.g. `.jsonl.zst`) | zstd |
//! | `.parquet` | one record per row, columns named like the JSON keys |
//!
//! Each non-blank line (or row) holds one [`TrainingSample`]. Malformed
//! records surface as recoverable [`IngestError::ManifestParse`] items and the
//! stream goes on; an I/O failure surfaces once as [`IngestError::ManifestIo`]
//! and ends the stream. For Parquet files the reported line is the 1-based
//! row number.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::columnar::{parquet_error, ParquetRows};
use crate::error::IngestError;
use crate::types::TrainingSample;

/// Default number of samples per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// On-disk layout of a manifest or benchmark file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Jsonl,
    JsonlGzip,
    JsonlZstd,
    Parquet,
}

impl ManifestFormat {
    /// Detect the layout from the file extension.
    pub fn detect(path: &Path) -> Result<Self, IngestError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "jsonl" | "json" | "ndjson" => Ok(ManifestFormat::Jsonl),
            "gz" => Ok(ManifestFormat::JsonlGzip),
            "zst" | "zstd" => Ok(ManifestFormat::JsonlZstd),
            "parquet" => Ok(ManifestFormat::Parquet),
            other => Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: format!("unknown extension {other:?}"),
            }),
        }
    }
}

/// Open `path` as a buffered line source, decompressing as needed.
pub(crate) fn open_lines(path: &Path) -> std::io::Result<(ManifestFormat, Box<dyn BufRead + Send>)> {
    let format = ManifestFormat::detect(path)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let file = File::open(path)?;
    let reader: Box<dyn BufRead + Send> = match format {
        ManifestFormat::Jsonl => Box::new(BufReader::new(file)),
        ManifestFormat::JsonlGzip => Box::new(BufReader::new(MultiGzDecoder::new(file))),
        ManifestFormat::JsonlZstd => Box::new(BufReader::new(zstd::stream::read::Decoder::new(file)?)),
        ManifestFormat::Parquet => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "parquet files have rows, not lines",
            ))
        }
    };
    Ok((format, reader))
}

/// Reads raw lines, tracking 1-based line numbers. Invalid UTF-8 is reported
/// per line instead of failing the whole stream.
pub(crate) struct LineSource {
    reader: Box<dyn BufRead + Send>,
    buf: Vec<u8>,
    line_no: usize,
}

pub(crate) enum Line {
    Text(usize, String),
    BadUtf8(usize, String),
}

impl LineSource {
    pub(crate) fn new(reader: Box<dyn BufRead + Send>) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(4096),
            line_no: 0,
        }
    }

    pub(crate) fn line_no(&self) -> usize {
        self.line_no
    }

    /// Next non-blank line, `Ok(None)` at EOF.
    pub(crate) fn next_line(&mut self) -> std::io::Result<Option<Line>> {
        loop {
            self.buf.clear();
            let read = self.reader.read_until(b'\n', &mut self.buf)?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            match std::str::from_utf8(&self.buf) {
                Ok(s) if s.trim().is_empty() => continue,
                Ok(s) => return Ok(Some(Line::Text(self.line_no, s.trim_end().to_owned()))),
                Err(e) => return Ok(Some(Line::BadUtf8(self.line_no, e.to_string()))),
            }
        }
    }
}

enum RecordSource {
    Lines(LineSource),
    Rows(ParquetRows),
}

/// Streaming manifest reader. Yields one item per non-blank line or per row.
pub struct ManifestReader {
    path: PathBuf,
    source: RecordSource,
    records: usize,
    done: bool,
}

impl ManifestReader {
    /// Open a manifest file. Fails with [`IngestError::UnsupportedFormat`] or
    /// [`IngestError::ManifestIo`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref().to_path_buf();
        let format = ManifestFormat::detect(&path)?;
        let source = match format {
            ManifestFormat::Parquet => RecordSource::Rows(ParquetRows::open(&path)?),
            _ => {
                let (_, reader) =
                    open_lines(&path).map_err(|e| IngestError::manifest_io(&path, 0, &e))?;
                RecordSource::Lines(LineSource::new(reader))
            }
        };
        info!(path = %path.display(), format = ?format, "manifest_open");
        Ok(Self {
            path,
            source,
            records: 0,
            done: false,
        })
    }

    /// Read a manifest from any buffered source. `label` is used in errors.
    pub fn from_reader(label: impl Into<PathBuf>, reader: Box<dyn BufRead + Send>) -> Self {
        Self {
            path: label.into(),
            source: RecordSource::Lines(LineSource::new(reader)),
            records: 0,
            done: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last line number consumed (1-based, blank lines included), or the
    /// last row number for Parquet manifests.
    pub fn line(&self) -> usize {
        match &self.source {
            RecordSource::Lines(lines) => lines.line_no(),
            RecordSource::Rows(rows) => rows.row_no(),
        }
    }

    /// Group records into batches of at most `batch_size` (minimum 1).
    /// Rejected records count towards the size.
    pub fn batches(self, batch_size: usize) -> ManifestBatches {
        ManifestBatches {
            reader: self,
            batch_size: batch_size.max(1),
        }
    }

    fn parse_error(&self, line: usize, message: impl Into<String>) -> IngestError {
        IngestError::ManifestParse {
            path: self.path.clone(),
            line,
            message: message.into(),
        }
    }
}

impl ManifestReader {
    fn next_line_record(&mut self) -> Option<Result<TrainingSample, IngestError>> {
        let RecordSource::Lines(lines) = &mut self.source else {
            return None;
        };
        match lines.next_line() {
            Ok(None) => None,
            Ok(Some(Line::BadUtf8(line, msg))) => {
                Some(Err(self.parse_error(line, format!("invalid utf-8: {msg}"))))
            }
            Ok(Some(Line::Text(line, text))) => {
                self.records += 1;
                Some(parse_sample(&text).map_err(|msg| self.parse_error(line, msg)))
            }
            Err(e) => {
                let line = lines.line_no() + 1;
                self.done = true;
                Some(Err(IngestError::manifest_io(&self.path, line, &e)))
            }
        }
    }

    fn next_row_record(&mut self) -> Option<Result<TrainingSample, IngestError>> {
        let RecordSource::Rows(rows) = &mut self.source else {
            return None;
        };
        match rows.next_row() {
            Ok(None) => None,
            Ok(Some((row, value))) => {
                self.records += 1;
                Some(sample_from_value(value).map_err(|msg| self.parse_error(row, msg)))
            }
            Err(e) => {
                let row = rows.row_no() + 1;
                self.done = true;
                Some(Err(parquet_error(&self.path, row, e)))
            }
        }
    }
}

impl Iterator for ManifestReader {
    type Item = Result<TrainingSample, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.source {
            RecordSource::Lines(_) => self.next_line_record(),
            RecordSource::Rows(_) => self.next_row_record(),
        };
        if item.is_none() {
            self.done = true;
            debug!(path = %self.path.display(), records = self.records, "manifest_eof");
        }
        item
    }
}

fn parse_sample(line: &str) -> Result<TrainingSample, String> {
    let sample: TrainingSample = serde_json::from_str(line).map_err(|e| e.to_string())?;
    check_sample(sample)
}

fn sample_from_value(value: JsonValue) -> Result<TrainingSample, String> {
    let sample: TrainingSample = serde_json::from_value(value).map_err(|e| e.to_string())?;
    check_sample(sample)
}

fn check_sample(sample: TrainingSample) -> Result<TrainingSample, String> {
    if sample.sample_id.trim().is_empty() {
        return Err("empty sample_id".into());
    }
    Ok(sample)
}

/// One batch of manifest records.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ManifestBatch {
    pub samples: Vec<TrainingSample>,
    /// Recoverable per-record errors met while filling this batch.
    pub rejected: Vec<IngestError>,
}

impl ManifestBatch {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() && self.rejected.is_empty()
    }
}

/// Iterator over [`ManifestBatch`]es. A fatal error is yielded once and ends
/// iteration; the partial batch it interrupted is dropped.
pub struct ManifestBatches {
    reader: ManifestReader,
    batch_size: usize,
}

impl ManifestBatches {
    pub fn path(&self) -> &Path {
        self.reader.path()
    }
}

impl Iterator for ManifestBatches {
    type Item = Result<ManifestBatch, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = ManifestBatch {
            samples: Vec::with_capacity(self.batch_size),
            rejected: Vec::new(),
        };
        while batch.samples.len() + batch.rejected.len() < self.batch_size {
            match self.reader.next() {
                None => break,
                Some(Ok(sample)) => batch.samples.push(sample),
                Some(Err(err)) if err.is_recoverable() => batch.rejected.push(err),
                Some(Err(err)) => return Some(Err(err)),
            }
        }
        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}
