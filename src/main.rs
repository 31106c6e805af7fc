use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use invoice_extractor::application::ports::{ExtractionStore, OracleResolver};
use invoice_extractor::application::services::{
    DeduplicationGate, JobRegistry, PipelineOrchestrator, Redactor, WorkerPool,
};
use invoice_extractor::infrastructure::artifacts::XlsxRenderer;
use invoice_extractor::infrastructure::llm::OracleFactory;
use invoice_extractor::infrastructure::observability::{TracingConfig, init_tracing};
use invoice_extractor::infrastructure::persistence::{
    InMemoryExtractionStore, PgExtractionStore, create_pool, ensure_schema,
};
use invoice_extractor::infrastructure::reference::FsReferenceLibrary;
use invoice_extractor::infrastructure::text_processing::{
    PdfiumTextExtractor, PlainTextExtractor,
};
use invoice_extractor::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load configuration")?;

    init_tracing(&TracingConfig::from_settings(
        environment.as_str(),
        &settings.logging,
    ));

    let store: Arc<dyn ExtractionStore> = match &settings.database.url {
        Some(url) => {
            let pool = create_pool(url, settings.database.max_connections).await?;
            ensure_schema(&pool).await?;
            Arc::new(PgExtractionStore::new(pool))
        }
        None => {
            tracing::warn!("No database configured, extractions are kept in memory");
            Arc::new(InMemoryExtractionStore::new())
        }
    };

    let redactor = Redactor::new(&settings.extraction.redaction_terms)
        .context("Invalid redaction term list")?;

    let registry = Arc::new(JobRegistry::new(settings.registry.subscriber_capacity));
    let oracles: Arc<dyn OracleResolver> = Arc::new(OracleFactory::new(settings.llm.clone()));

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        Arc::clone(&registry),
        Arc::clone(&oracles),
        Arc::new(PdfiumTextExtractor::new()),
        Arc::new(PlainTextExtractor),
        Arc::new(FsReferenceLibrary::new(
            settings.storage.knowledge_dir.clone(),
            settings.storage.issuer_references.clone(),
        )),
        Arc::new(XlsxRenderer::new()),
        DeduplicationGate::new(store),
        redactor,
        WorkerPool::new(settings.workers.max_concurrency),
        settings.pipeline(),
    ));

    tracing::info!(
        strategy = %settings.extraction.strategy,
        batch_size = settings.extraction.batch_size,
        workers = settings.workers.max_concurrency,
        "Pipeline configured"
    );

    let state = AppState::new(
        orchestrator,
        oracles,
        settings.extraction.max_upload_bytes(),
    );
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
