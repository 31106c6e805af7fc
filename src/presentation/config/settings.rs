use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment as EnvironmentSource, File};
use serde::Deserialize;

use crate::application::services::{
    DEFAULT_BATCH_SIZE, DEFAULT_ISSUER_CONFIDENCE_THRESHOLD, DEFAULT_LOW_CONFIDENCE_THRESHOLD,
    DEFAULT_MAX_CONCURRENCY, DEFAULT_SUBSCRIBER_CAPACITY, ExtractionStrategy, PipelineSettings,
};
use crate::application::services::segmentation::{
    AnchorSettings, DEFAULT_FUZZY_THRESHOLD, DEFAULT_FUZZY_WINDOW_CHARS, DEFAULT_ITEM_MARKER,
};

use super::Environment;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub llm: LlmSettings,
    pub extraction: ExtractionSettings,
    pub workers: WorkerSettings,
    pub registry: RegistrySettings,
    pub storage: StorageSettings,
    pub database: DatabaseSettings,
}

impl Settings {
    /// Layers `appsettings.{environment}.toml` under `APP_`-prefixed
    /// environment variables, e.g. `APP_SERVER__PORT=8080`.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str().to_lowercase()))
                    .required(false),
            )
            .add_source(
                EnvironmentSource::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("extraction.redaction_terms")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn pipeline(&self) -> PipelineSettings {
        PipelineSettings {
            strategy: self.extraction.strategy,
            batch_size: self.extraction.batch_size,
            item_marker: self.extraction.item_marker.clone(),
            anchor: AnchorSettings {
                fuzzy_window_chars: self.extraction.fuzzy_window_chars,
                fuzzy_threshold: self.extraction.fuzzy_threshold,
            },
            low_confidence_threshold: self.extraction.low_confidence_threshold,
            issuer_confidence_threshold: self.extraction.issuer_confidence_threshold,
            artifact_dir: self.storage.artifact_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl LoggingSettings {
    pub fn json_format(&self) -> bool {
        self.enable_json
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info,invoice_extractor=debug,tower_http=debug".to_string(),
            enable_json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub request_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.1:8b".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            request_timeout_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub strategy: ExtractionStrategy,
    pub batch_size: usize,
    pub item_marker: String,
    pub fuzzy_window_chars: usize,
    pub fuzzy_threshold: f64,
    pub low_confidence_threshold: f64,
    pub issuer_confidence_threshold: f64,
    pub redaction_terms: Vec<String>,
    pub max_upload_size_mb: usize,
}

impl ExtractionSettings {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            strategy: ExtractionStrategy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            item_marker: DEFAULT_ITEM_MARKER.to_string(),
            fuzzy_window_chars: DEFAULT_FUZZY_WINDOW_CHARS,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            low_confidence_threshold: DEFAULT_LOW_CONFIDENCE_THRESHOLD,
            issuer_confidence_threshold: DEFAULT_ISSUER_CONFIDENCE_THRESHOLD,
            redaction_terms: Vec::new(),
            max_upload_size_mb: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub max_concurrency: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub subscriber_capacity: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub artifact_dir: PathBuf,
    pub knowledge_dir: PathBuf,
    pub issuer_references: HashMap<String, String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            artifact_dir: std::env::temp_dir().join("invoice-extractor"),
            knowledge_dir: PathBuf::from("knowledge"),
            issuer_references: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}
