use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{ContentHash, DocumentHeader, JobId};

use super::RepositoryError;

/// One canonical record: normalized text fields and two-decimal amounts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CanonicalItem {
    pub description: String,
    pub code: String,
    pub date: String,
    pub installment: String,
    pub currency: String,
    pub quantity: String,
    pub unit_price: String,
    pub total: String,
    pub discount: String,
}

#[derive(Debug, Clone)]
pub struct ExtractionDocument {
    pub content_hash: ContentHash,
    pub job_id: JobId,
    pub filename: String,
    pub issuer: String,
    pub header: DocumentHeader,
    pub items: Vec<CanonicalItem>,
    pub extracted_at: DateTime<Utc>,
}

/// Content-addressed persistence of finished extractions.
#[async_trait]
pub trait ExtractionStore: Send + Sync {
    async fn exists_by_hash(&self, hash: &ContentHash) -> Result<bool, RepositoryError>;

    async fn insert(&self, document: &ExtractionDocument) -> Result<(), RepositoryError>;
}
