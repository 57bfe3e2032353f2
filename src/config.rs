//! YAML configuration for contamination scans.
//!
//! A config file names one training manifest, one benchmark source and the
//! scan parameters. Everything under `scan` is optional.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "mmlu vs pretrain-v3"
//!
//! manifest: data/pretrain-v3.jsonl.zst
//!
//! benchmark:
//!   adapter: jsonl
//!   path: data/mmlu.test.jsonl
//!   text_field: question
//!
//! split: test
//! output: reports/mmlu.json
//!
//! log_level: info
//! log_json: false
//!
//! scan:
//!   perceptual:
//!     ngram_size: 5
//!     num_hashes: 64
//!   num_bands: 16
//!   rows_per_band: 4
//!   near_duplicate_threshold: 0.7
//!   match_detail_cap: 100
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use ingest::BenchmarkSource;
use matcher::ScanConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}

/// Top-level YAML configuration for one contamination scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DecontamConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    /// Training manifest (JSONL, optionally `.gz` or `.zst`)
    pub manifest: PathBuf,

    /// Benchmark to scan
    pub benchmark: BenchmarkSource,

    /// Split label copied into the report
    #[serde(default)]
    pub split: Option<String>,

    /// Where to write the JSON report; parent directories are created
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Default tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones
    #[serde(default)]
    pub log_json: bool,

    #[serde(default)]
    pub scan: ScanConfig,
}

impl DecontamConfig {
    /// A config with default scan settings.
    pub fn new(manifest: impl Into<PathBuf>, benchmark: BenchmarkSource) -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            manifest: manifest.into(),
            benchmark,
            split: None,
            output: None,
            log_level: default_log_level(),
            log_json: false,
            scan: ScanConfig::default(),
        }
    }

    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: DecontamConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        if self.manifest.as_os_str().is_empty() {
            return Err(ConfigLoadError::MissingField("manifest".to_string()));
        }
        if let BenchmarkSource::Jsonl { path, text_field, .. } = &self.benchmark {
            if path.as_os_str().is_empty() {
                return Err(ConfigLoadError::MissingField("benchmark.path".to_string()));
            }
            if text_field.is_empty() {
                return Err(ConfigLoadError::Validation(
                    "benchmark.text_field must not be empty".to_string(),
                ));
            }
        }

        self.scan
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
