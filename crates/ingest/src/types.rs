//! Record types read from training manifests and benchmark sources.
//!
//! ```text
//! TrainingSample                     BenchmarkExample
//! ├── sample_id: String  ("id")      ├── example_id: String  ("id")
//! ├── modality: Modality             └── text: String
//! ├── text: Option<String>
//! ├── source: Option<String>
//! ├── image_ref / video_ref
//! ├── license / timestamp
//! └── metadata: JSON object
//! ```
//!
//! Only `text` takes part in contamination detection. The other fields are
//! carried so that downstream tooling can trace a match back to its origin.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Modality of a training sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    #[default]
    Text,
    Image,
    Video,
    Multimodal,
}

/// One training manifest record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    #[serde(alias = "id")]
    pub sample_id: String,
    #[serde(default)]
    pub modality: Modality,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, JsonValue>,
}

impl TrainingSample {
    /// A text-only sample with no provenance fields.
    pub fn from_text(sample_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sample_id: sample_id.into(),
            modality: Modality::Text,
            text: Some(text.into()),
            source: None,
            image_ref: None,
            video_ref: None,
            license: None,
            timestamp: None,
            metadata: Map::new(),
        }
    }

    /// The text to index, if there is any. Whitespace-only text counts as
    /// missing.
    pub fn indexable_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// One benchmark example to scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkExample {
    #[serde(alias = "id")]
    pub example_id: String,
    #[serde(default)]
    pub text: String,
}

impl BenchmarkExample {
    pub fn new(example_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            example_id: example_id.into(),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_accepts_id_alias_and_defaults_modality() {
        let sample: TrainingSample =
            serde_json::from_str(r#"{"id": "s-1", "text": "hello"}"#).expect("parses");
        assert_eq!(sample.sample_id, "s-1");
        assert_eq!(sample.modality, Modality::Text);
        assert_eq!(sample.indexable_text(), Some("hello"));
        assert!(sample.metadata.is_empty());
    }

    #[test]
    fn sample_keeps_provenance_fields() {
        let line = r#"{"sample_id":"img-9","modality":"multimodal","text":"a cat",
            "image_ref":"s3://bucket/cat.png","license":"cc-by","source":"crawl-2024",
            "timestamp":"2024-05-01T00:00:00Z","metadata":{"lang":"en"},"extra":1}"#;
        let sample: TrainingSample = serde_json::from_str(line).expect("parses");
        assert_eq!(sample.modality, Modality::Multimodal);
        assert_eq!(sample.image_ref.as_deref(), Some("s3://bucket/cat.png"));
        assert_eq!(sample.license.as_deref(), Some("cc-by"));
        assert_eq!(sample.metadata.get("lang"), Some(&JsonValue::from("en")));
    }

    #[test]
    fn whitespace_text_is_not_indexable() {
        let mut sample = TrainingSample::from_text("s", "   ");
        assert_eq!(sample.indexable_text(), None);
        sample.text = None;
        assert_eq!(sample.indexable_text(), None);
    }

    #[test]
    fn unknown_modality_is_rejected() {
        let res: Result<TrainingSample, _> =
            serde_json::from_str(r#"{"sample_id":"x","modality":"audio"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn benchmark_example_alias() {
        let ex: BenchmarkExample =
            serde_json::from_str(r#"{"id":"q-1","text":"What is rain?"}"#).expect("parses");
        assert_eq!(ex, BenchmarkExample::new("q-1", "What is rain?"));
    }
}
