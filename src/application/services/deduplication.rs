use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::application::ports::{CanonicalItem, ExtractionDocument, ExtractionStore};
use crate::domain::{ContentHash, ExtractionResult, JobId, LineItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Inserted,
    Duplicate,
    Failed,
}

/// Canonical form of an extraction: the input to the content hash.
/// Fields serialize in alphabetical order and items are sorted, so the same
/// records in any order produce the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRecordSet {
    pub access_key: String,
    pub issue_date: String,
    pub items: Vec<CanonicalItem>,
    pub merchant_name: String,
    pub tax_id: String,
}

/// Collapses whitespace runs to one space and trims.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalize_amount(amount: f64) -> String {
    // -0.00 and 0.00 must hash identically
    let rounded = (amount * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0.00".to_string();
    }
    format!("{rounded:.2}")
}

pub fn canonical_item(item: &LineItem) -> CanonicalItem {
    let text = |v: &Option<String>| v.as_deref().map(normalize_text).unwrap_or_default();
    CanonicalItem {
        description: normalize_text(&item.description),
        code: text(&item.code),
        date: text(&item.date),
        installment: text(&item.installment),
        currency: normalize_text(&item.currency),
        quantity: normalize_amount(item.quantity),
        unit_price: normalize_amount(item.unit_price),
        total: normalize_amount(item.total),
        discount: normalize_amount(item.discount),
    }
}

/// Issuer, confidence and page are detection artifacts and do not take part.
pub fn canonicalize(result: &ExtractionResult) -> CanonicalRecordSet {
    let header = &result.header;
    let text = |v: &Option<String>| v.as_deref().map(normalize_text).unwrap_or_default();

    let mut items: Vec<CanonicalItem> = result.items.iter().map(canonical_item).collect();
    items.sort();

    CanonicalRecordSet {
        access_key: text(&header.access_key),
        issue_date: text(&header.issue_date),
        items,
        merchant_name: text(&header.merchant_name),
        tax_id: text(&header.tax_id),
    }
}

pub fn content_hash(canonical: &CanonicalRecordSet) -> ContentHash {
    let mut hasher = Sha256::new();
    // serializing plain strings and vectors of them cannot fail
    let bytes = serde_json::to_vec(canonical).unwrap_or_default();
    hasher.update(&bytes);
    ContentHash::from_hex(format!("{:x}", hasher.finalize()))
}

/// Content-addressed persistence. Failures are logged and reported as an
/// outcome; they never fail the job.
#[derive(Clone)]
pub struct DeduplicationGate {
    store: Arc<dyn ExtractionStore>,
}

impl DeduplicationGate {
    pub fn new(store: Arc<dyn ExtractionStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, result), fields(job_id = %job_id))]
    pub async fn persist(
        &self,
        job_id: JobId,
        filename: &str,
        issuer: &str,
        result: &ExtractionResult,
    ) -> PersistOutcome {
        let canonical = canonicalize(result);
        let hash = content_hash(&canonical);

        match self.store.exists_by_hash(&hash).await {
            Ok(true) => {
                tracing::info!(hash = %hash, "Duplicate extraction, skipping persistence");
                return PersistOutcome::Duplicate;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(error = %e, "Duplicate check failed");
                return PersistOutcome::Failed;
            }
        }

        let document = ExtractionDocument {
            content_hash: hash.clone(),
            job_id,
            filename: filename.to_string(),
            issuer: issuer.to_string(),
            header: result.header.clone(),
            items: canonical.items,
            extracted_at: Utc::now(),
        };

        match self.store.insert(&document).await {
            Ok(()) => {
                tracing::info!(hash = %hash, items = document.items.len(), "Extraction persisted");
                PersistOutcome::Inserted
            }
            Err(e) => {
                tracing::error!(error = %e, hash = %hash, "Failed to persist extraction");
                PersistOutcome::Failed
            }
        }
    }
}
