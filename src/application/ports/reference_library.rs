use async_trait::async_trait;

/// Issuer-specific reference text used to enrich extraction prompts.
#[async_trait]
pub trait ReferenceLibrary: Send + Sync {
    async fn reference_for(&self, issuer: &str) -> Option<String>;
}
