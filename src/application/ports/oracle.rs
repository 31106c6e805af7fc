use async_trait::async_trait;

/// Stateless request/response text-understanding service.
#[async_trait]
pub trait ExtractionOracle: Send + Sync {
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, OracleError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("rate limited")]
    RateLimited,
    #[error("empty response from {0}")]
    EmptyResponse(String),
    #[error("backend misconfigured: {0}")]
    Misconfigured(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
