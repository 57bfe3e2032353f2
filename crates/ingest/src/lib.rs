//! Training manifest and benchmark ingestion.
//!
//! This crate turns files into the two record types the scan engine consumes:
//!
//! - [`TrainingSample`]: streamed from a JSONL manifest (optionally gzip or
//!   zstd compressed) or a Parquet file by [`ManifestReader`], one record or
//!   one [`ManifestBatch`] at a time.
//! - [`BenchmarkExample`]: loaded through a [`BenchmarkSource`] adapter.
//!
//! # Failure model
//!
//! Malformed manifest lines do not stop a build. They are yielded as
//! recoverable [`IngestError::ManifestParse`] values with the path and line
//! number so the caller can count and log them. An unreadable manifest or
//! benchmark is fatal.
//!
//! ```rust
//! use std::io::Cursor;
//! use ingest::{IngestError, ManifestReader};
//!
//! let data = "{\"sample_id\":\"s1\",\"text\":\"hello\"}\nnot json\n";
//! let reader = ManifestReader::from_reader("inline.jsonl", Box::new(Cursor::new(data)));
//!
//! let mut ok = 0;
//! let mut skipped = 0;
//! for item in reader {
//!     match item {
//!         Ok(_) => ok += 1,
//!         Err(e) if e.is_recoverable() => skipped += 1,
//!         Err(e) => panic!("fatal: {e}"),
//!     }
//! }
//! assert_eq!((ok, skipped), (1, 1));
//! ```

mod benchmark;
mod columnar;
mod error;
mod manifest;
mod types;

pub use crate::benchmark::BenchmarkSource;
pub use crate::error::IngestError;
pub use crate::manifest::{
    ManifestBatch, ManifestBatches, ManifestFormat, ManifestReader, DEFAULT_BATCH_SIZE,
};
pub use crate::types::{BenchmarkExample, Modality, TrainingSample};
