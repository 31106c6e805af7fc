use crate::domain::ExtractionResult;

/// Renders records into spreadsheet bytes. CPU-bound; callers dispatch it to
/// the worker pool.
pub trait ArtifactRenderer: Send + Sync {
    fn render(&self, result: &ExtractionResult) -> Result<Vec<u8>, ArtifactError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("render failed: {0}")]
    RenderFailed(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
