//! Benchmark sources.
//!
//! Every source shares one capability, [`BenchmarkSource::load`], which
//! yields `{example_id, text}` pairs. The scan engine never sees anything
//! else about a benchmark.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::error::IngestError;
use crate::manifest::{open_lines, Line, LineSource};
use crate::types::BenchmarkExample;

fn default_text_field() -> String {
    "text".to_string()
}

/// A known benchmark adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adapter", rename_all = "snake_case")]
pub enum BenchmarkSource {
    /// One JSON object per line. The text is looked up under
    /// `inputs.<text_field>` first, then `<text_field>` at the top level; a
    /// missing text scans as empty. The id comes from `example_id` or `id`
    /// (string or integer).
    Jsonl {
        path: PathBuf,
        #[serde(default = "default_text_field")]
        text_field: String,
        /// Keep only the first `limit` examples.
        #[serde(default)]
        limit: Option<usize>,
        /// Name for reports; defaults to the file stem.
        #[serde(default)]
        name: Option<String>,
    },
    /// Examples already in memory.
    InMemory {
        name: String,
        examples: Vec<BenchmarkExample>,
    },
}

impl BenchmarkSource {
    pub fn jsonl(path: impl Into<PathBuf>) -> Self {
        BenchmarkSource::Jsonl {
            path: path.into(),
            text_field: default_text_field(),
            limit: None,
            name: None,
        }
    }

    pub fn in_memory(name: impl Into<String>, examples: Vec<BenchmarkExample>) -> Self {
        BenchmarkSource::InMemory {
            name: name.into(),
            examples,
        }
    }

    /// Human-readable benchmark name for reports.
    pub fn name(&self) -> String {
        match self {
            BenchmarkSource::Jsonl { name: Some(name), .. } => name.clone(),
            BenchmarkSource::Jsonl { path, .. } => path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.split('.').next().unwrap_or(n).to_string())
                .unwrap_or_else(|| path.display().to_string()),
            BenchmarkSource::InMemory { name, .. } => name.clone(),
        }
    }

    /// Load every example. Any failure is fatal.
    pub fn load(&self) -> Result<Vec<BenchmarkExample>, IngestError> {
        match self {
            BenchmarkSource::Jsonl {
                path,
                text_field,
                limit,
                ..
            } => {
                let examples = load_jsonl(path, text_field, *limit)?;
                info!(
                    path = %path.display(),
                    text_field = %text_field,
                    examples = examples.len(),
                    "benchmark_loaded"
                );
                Ok(examples)
            }
            BenchmarkSource::InMemory { examples, .. } => Ok(examples.clone()),
        }
    }
}

fn load_jsonl(
    path: &Path,
    text_field: &str,
    limit: Option<usize>,
) -> Result<Vec<BenchmarkExample>, IngestError> {
    let (_, reader) = open_lines(path).map_err(|e| IngestError::benchmark_io(path, &e))?;
    let mut lines = LineSource::new(reader);
    let mut examples = Vec::new();
    let parse_error = |line: usize, message: String| IngestError::BenchmarkParse {
        path: path.to_path_buf(),
        line,
        message,
    };

    while limit.map_or(true, |l| examples.len() < l) {
        let line = lines
            .next_line()
            .map_err(|e| IngestError::benchmark_io(path, &e))?;
        match line {
            None => break,
            Some(Line::BadUtf8(n, msg)) => return Err(parse_error(n, format!("invalid utf-8: {msg}"))),
            Some(Line::Text(n, text)) => {
                let value: JsonValue =
                    serde_json::from_str(&text).map_err(|e| parse_error(n, e.to_string()))?;
                let example = example_from_value(&value, text_field)
                    .ok_or_else(|| parse_error(n, "missing example_id".into()))?;
                examples.push(example);
            }
        }
    }
    Ok(examples)
}

fn example_from_value(value: &JsonValue, text_field: &str) -> Option<BenchmarkExample> {
    let example_id = ["example_id", "id"]
        .iter()
        .filter_map(|key| value.get(*key))
        .find_map(|id| match id {
            JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        })?;

    let text = value
        .get("inputs")
        .and_then(|inputs| inputs.get(text_field))
        .and_then(JsonValue::as_str)
        .filter(|t| !t.is_empty())
        .or_else(|| value.get(text_field).and_then(JsonValue::as_str))
        .unwrap_or_default()
        .to_string();

    Some(BenchmarkExample { example_id, text })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn write_jsonl(lines: &[&str]) -> tempfile::NamedTempFile {
        use std::io::Write;
        let mut file = tempfile::Builder::new()
            .suffix(".jsonl")
            .tempfile()
            .expect("tempfile");
        for line in lines {
            writeln!(file, "{line}").expect("write");
        }
        file
    }

    #[test]
    fn text_field_prefers_inputs_then_top_level() {
        let nested = json!({"example_id": "q1", "inputs": {"question": "nested?"}, "question": "top?"});
        let top = json!({"example_id": "q2", "question": "top?"});
        let missing = json!({"example_id": "q3"});

        assert_eq!(example_from_value(&nested, "question").map(|e| e.text), Some("nested?".into()));
        assert_eq!(example_from_value(&top, "question").map(|e| e.text), Some("top?".into()));
        assert_eq!(example_from_value(&missing, "question").map(|e| e.text), Some(String::new()));
    }

    #[test]
    fn numeric_and_aliased_ids() {
        let numeric = json!({"id": 42, "text": "x"});
        assert_eq!(
            example_from_value(&numeric, "text").map(|e| e.example_id),
            Some("42".into())
        );
        assert!(example_from_value(&json!({"text": "x"}), "text").is_none());
    }

    #[test]
    fn load_jsonl_with_limit_and_name() {
        let file = write_jsonl(&[
            r#"{"example_id":"a","text":"first"}"#,
            "",
            r#"{"example_id":"b","text":"second"}"#,
            r#"{"example_id":"c","text":"third"}"#,
        ]);
        let source = BenchmarkSource::Jsonl {
            path: file.path().to_path_buf(),
            text_field: "text".into(),
            limit: Some(2),
            name: Some("mini".into()),
        };
        let examples = source.load().expect("loads");
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[1], BenchmarkExample::new("b", "second"));
        assert_eq!(source.name(), "mini");
    }

    #[test]
    fn malformed_benchmark_line_is_fatal() {
        let file = write_jsonl(&[r#"{"example_id":"a","text":"ok"}"#, "{oops"]);
        let err = BenchmarkSource::jsonl(file.path()).load().expect_err("fails");
        assert!(matches!(err, IngestError::BenchmarkParse { line: 2, .. }));
    }

    #[test]
    fn missing_benchmark_file_is_fatal() {
        let err = BenchmarkSource::jsonl("/nope/bench.jsonl").load().expect_err("fails");
        assert!(matches!(err, IngestError::BenchmarkIo { .. }));
    }

    #[test]
    fn name_defaults_to_file_stem() {
        assert_eq!(BenchmarkSource::jsonl("/data/mmlu.val.jsonl").name(), "mmlu");
        assert_eq!(BenchmarkSource::in_memory("demo", vec![]).name(), "demo");
    }

    #[test]
    fn source_deserializes_from_tagged_config() {
        let source: BenchmarkSource = serde_json::from_value(json!({
            "adapter": "jsonl",
            "path": "bench.jsonl",
            "text_field": "question"
        }))
        .expect("parses");
        assert_eq!(
            source,
            BenchmarkSource::Jsonl {
                path: "bench.jsonl".into(),
                text_field: "question".into(),
                limit: None,
                name: None,
            }
        );
    }
}
