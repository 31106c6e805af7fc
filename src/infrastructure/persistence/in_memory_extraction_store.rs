use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::application::ports::{ExtractionDocument, ExtractionStore, RepositoryError};
use crate::domain::ContentHash;

/// Process-local store used when no database is configured, and in tests.
#[derive(Default)]
pub struct InMemoryExtractionStore {
    documents: Mutex<HashMap<ContentHash, ExtractionDocument>>,
    unavailable: bool,
}

impl InMemoryExtractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails, for exercising non-fatal persistence.
    pub fn unavailable() -> Self {
        Self {
            documents: Mutex::default(),
            unavailable: true,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn documents(&self) -> Vec<ExtractionDocument> {
        self.lock().values().cloned().collect()
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable {
            return Err(RepositoryError::ConnectionFailed(
                "store unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ContentHash, ExtractionDocument>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ExtractionStore for InMemoryExtractionStore {
    async fn exists_by_hash(&self, hash: &ContentHash) -> Result<bool, RepositoryError> {
        self.check_available()?;
        Ok(self.lock().contains_key(hash))
    }

    async fn insert(&self, document: &ExtractionDocument) -> Result<(), RepositoryError> {
        self.check_available()?;
        self.lock()
            .entry(document.content_hash.clone())
            .or_insert_with(|| document.clone());
        Ok(())
    }
}
