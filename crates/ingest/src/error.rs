//! Error types produced by the ingest crate.
//!
//! Manifest and benchmark failures carry the file path and, where a line was
//! being read, its 1-based line number.
//!
//! | Error | Recoverable | Description |
//! |-------|-------------|-------------|
//! | [`ManifestParse`](IngestError::ManifestParse) | yes | One manifest line is malformed; skip it and count it |
//! | [`ManifestIo`](IngestError::ManifestIo) | no | The manifest cannot be opened or read |
//! | [`UnsupportedFormat`](IngestError::UnsupportedFormat) | no | The manifest extension has no reader |
//! | [`BenchmarkIo`](IngestError::BenchmarkIo) | no | The benchmark source cannot be opened or read |
//! | [`BenchmarkParse`](IngestError::BenchmarkParse) | no | A benchmark line is malformed |
//!
//! ```rust
//! use std::path::PathBuf;
//! use ingest::IngestError;
//!
//! let err = IngestError::ManifestParse {
//!     path: PathBuf::from("train.jsonl"),
//!     line: 7,
//!     message: "missing field `sample_id`".into(),
//! };
//! assert!(err.is_recoverable());
//! assert_eq!(err.line(), Some(7));
//! assert!(err.to_string().contains("train.jsonl:7"));
//! ```
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading training manifests and benchmark sources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// The manifest could not be opened or a read failed. Line `0` means the
    /// failure happened before the first line.
    #[error("manifest I/O error at {}:{line}: {message}", .path.display())]
    ManifestIo {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A single manifest record is malformed: bad JSON, bad UTF-8, or a
    /// missing/empty `sample_id`.
    #[error("malformed manifest record at {}:{line}: {message}", .path.display())]
    ManifestParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("unsupported manifest format for {}: {reason}", .path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("benchmark I/O error at {}: {message}", .path.display())]
    BenchmarkIo { path: PathBuf, message: String },

    #[error("malformed benchmark example at {}:{line}: {message}", .path.display())]
    BenchmarkParse {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

impl IngestError {
    /// Only per-record manifest errors can be skipped; everything else aborts
    /// the build or scan.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, IngestError::ManifestParse { .. })
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            IngestError::ManifestIo { line, .. }
            | IngestError::ManifestParse { line, .. }
            | IngestError::BenchmarkParse { line, .. } => Some(*line),
            _ => None,
        }
    }

    pub(crate) fn manifest_io(path: impl Into<PathBuf>, line: usize, err: &std::io::Error) -> Self {
        IngestError::ManifestIo {
            path: path.into(),
            line,
            message: err.to_string(),
        }
    }

    pub(crate) fn benchmark_io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        IngestError::BenchmarkIo {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
