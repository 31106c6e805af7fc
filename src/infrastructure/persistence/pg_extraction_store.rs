use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use crate::application::ports::{
    ExtractionDocument, ExtractionStore, RepositoryError,
};
use crate::domain::ContentHash;

pub struct PgExtractionStore {
    pool: PgPool,
}

impl PgExtractionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExtractionStore for PgExtractionStore {
    #[instrument(skip(self), fields(hash = %hash))]
    async fn exists_by_hash(&self, hash: &ContentHash) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM extractions WHERE content_hash = $1)")
                .bind(hash.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(exists)
    }

    /// A concurrent insert of the same hash loses on the unique constraint
    /// and is treated as already stored.
    #[instrument(skip(self, document), fields(hash = %document.content_hash, job_id = %document.job_id))]
    async fn insert(&self, document: &ExtractionDocument) -> Result<(), RepositoryError> {
        let header = serde_json::to_value(&document.header)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let items = serde_json::to_value(&document.items)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO extractions (content_hash, job_id, filename, issuer, header, items, extracted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (content_hash) DO NOTHING
            "#,
        )
        .bind(document.content_hash.as_str())
        .bind(document.job_id.as_uuid())
        .bind(&document.filename)
        .bind(&document.issuer)
        .bind(header)
        .bind(items)
        .bind(document.extracted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}
