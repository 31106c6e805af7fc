use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::application::ports::ReferenceLibrary;

/// Reference texts stored as files under a knowledge directory, addressed by
/// an issuer-to-filename map. Lookups are case-insensitive on the issuer.
pub struct FsReferenceLibrary {
    root: PathBuf,
    files: HashMap<String, String>,
}

impl FsReferenceLibrary {
    pub fn new(root: impl Into<PathBuf>, files: HashMap<String, String>) -> Self {
        Self {
            root: root.into(),
            files: files
                .into_iter()
                .map(|(issuer, file)| (issuer.trim().to_lowercase(), file))
                .collect(),
        }
    }
}

#[async_trait]
impl ReferenceLibrary for FsReferenceLibrary {
    #[tracing::instrument(skip(self))]
    async fn reference_for(&self, issuer: &str) -> Option<String> {
        let file = self.files.get(&issuer.trim().to_lowercase())?;
        let path = self.root.join(file);

        match tokio::fs::read_to_string(&path).await {
            Ok(text) if !text.trim().is_empty() => {
                tracing::debug!(path = %path.display(), "Issuer reference loaded");
                Some(text)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Issuer reference unreadable");
                None
            }
        }
    }
}
