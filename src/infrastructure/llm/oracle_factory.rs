use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{ExtractionOracle, OracleError, OracleResolver};
use crate::domain::OracleBackend;
use crate::presentation::config::LlmSettings;

use super::{OllamaClient, OpenAiClient};

pub const OFFLINE_PROVIDER: &str = "offline";
pub const ONLINE_PROVIDER: &str = "online";

/// Resolves `offline` to the local Ollama backend and `online` to the hosted
/// OpenAI backend. Clients are built lazily so a missing API key only fails
/// jobs that ask for the hosted backend.
pub struct OracleFactory {
    settings: LlmSettings,
}

impl OracleFactory {
    pub fn new(settings: LlmSettings) -> Self {
        Self { settings }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.settings.request_timeout_secs)
    }
}

impl OracleResolver for OracleFactory {
    fn backend(&self, provider: &str) -> OracleBackend {
        match provider {
            OFFLINE_PROVIDER => OracleBackend::new(provider, self.settings.ollama_model.as_str()),
            ONLINE_PROVIDER => OracleBackend::new(provider, self.settings.openai_model.as_str()),
            other => OracleBackend::new(other, ""),
        }
    }

    fn resolve(&self, provider: &str) -> Result<Arc<dyn ExtractionOracle>, OracleError> {
        match provider {
            OFFLINE_PROVIDER => Ok(Arc::new(OllamaClient::new(
                self.settings.ollama_base_url.clone(),
                self.settings.ollama_model.clone(),
                self.timeout(),
            )?)),
            ONLINE_PROVIDER => Ok(Arc::new(OpenAiClient::new(
                self.settings.openai_base_url.clone(),
                self.settings.openai_api_key.clone().unwrap_or_default(),
                self.settings.openai_model.clone(),
                self.timeout(),
            )?)),
            other => Err(OracleError::Misconfigured(format!(
                "unknown oracle provider: {other}"
            ))),
        }
    }
}
