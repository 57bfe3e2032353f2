//! Row reader for Parquet training manifests.
//!
//! Each row becomes the JSON object `{column: value}` and goes through the
//! same deserialization as a JSONL line. Null cells are treated as absent.

use std::fs::File;
use std::path::Path;

use parquet::errors::ParquetError;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::reader::RowIter;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::IngestError;

/// Columns read as strings even when the file stores them as numbers.
const STRING_COLUMNS: [&str; 9] = [
    "sample_id",
    "id",
    "modality",
    "text",
    "source",
    "image_ref",
    "video_ref",
    "license",
    "timestamp",
];

pub(crate) struct ParquetRows {
    rows: RowIter<'static>,
    row_no: usize,
}

impl ParquetRows {
    pub(crate) fn open(path: &Path) -> Result<Self, IngestError> {
        let file = File::open(path).map_err(|e| IngestError::manifest_io(path, 0, &e))?;
        let reader = SerializedFileReader::new(file).map_err(|e| parquet_error(path, 0, e))?;
        let num_rows = reader.metadata().file_metadata().num_rows();
        debug!(path = %path.display(), num_rows, "parquet_manifest_open");
        Ok(Self {
            rows: RowIter::from_file_into(Box::new(reader)),
            row_no: 0,
        })
    }

    /// 1-based number of the last row read.
    pub(crate) fn row_no(&self) -> usize {
        self.row_no
    }

    /// Next row as a JSON object, `Ok(None)` after the last row.
    pub(crate) fn next_row(&mut self) -> Result<Option<(usize, JsonValue)>, ParquetError> {
        match self.rows.next() {
            None => Ok(None),
            Some(row) => {
                let row = row?;
                self.row_no += 1;
                Ok(Some((self.row_no, record_value(row.to_json_value()))))
            }
        }
    }
}

pub(crate) fn parquet_error(path: &Path, line: usize, err: ParquetError) -> IngestError {
    IngestError::ManifestIo {
        path: path.to_path_buf(),
        line,
        message: err.to_string(),
    }
}

/// Drop null cells and stringify scalar values of the string columns.
fn record_value(value: JsonValue) -> JsonValue {
    let JsonValue::Object(mut map) = value else {
        return value;
    };
    map.retain(|_, v| !v.is_null());
    for key in STRING_COLUMNS {
        if let Some(v) = map.get_mut(key) {
            if v.is_number() || v.is_boolean() {
                *v = JsonValue::String(v.to_string());
            }
        }
    }
    JsonValue::Object(map)
}
