use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{info, instrument, warn};

use crate::application::ports::RepositoryError;

const CONNECT_RETRIES: u32 = 5;

const CREATE_EXTRACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS extractions (
    id BIGSERIAL PRIMARY KEY,
    content_hash TEXT NOT NULL UNIQUE,
    job_id UUID NOT NULL,
    filename TEXT NOT NULL,
    issuer TEXT NOT NULL,
    header JSONB NOT NULL,
    items JSONB NOT NULL,
    extracted_at TIMESTAMPTZ NOT NULL
)
"#;

/// Connects with exponential backoff so the service tolerates a database
/// that is still starting.
#[instrument(skip(url))]
pub async fn create_pool(url: &str, max_connections: u32) -> Result<PgPool, RepositoryError> {
    let mut retries_left = CONNECT_RETRIES;
    let mut delay = Duration::from_millis(500);

    loop {
        let attempt = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await;

        match attempt {
            Ok(pool) => {
                info!(max_connections, "PostgreSQL connection pool established");
                return Ok(pool);
            }
            Err(e) if retries_left > 0 => {
                retries_left -= 1;
                warn!(
                    error = %e,
                    retries_left,
                    delay_ms = delay.as_millis(),
                    "PostgreSQL unavailable, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(RepositoryError::ConnectionFailed(e.to_string())),
        }
    }
}

pub async fn ensure_schema(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::query(CREATE_EXTRACTIONS_TABLE)
        .execute(pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    info!("Extractions table ready");
    Ok(())
}
