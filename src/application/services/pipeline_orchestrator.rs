use std::path::PathBuf;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::Instrument;

use crate::application::ports::{
    ArtifactError, ArtifactRenderer, ExtractionOracle, OracleError, OracleResolver,
    ReferenceLibrary, TextExtractionError, TextExtractor,
};
use crate::domain::{ExtractedDocument, ExtractionResult, JobId, JobInput, JobStatus};

use super::batch_coordinator::{BatchCoordinator, BatchExtractionError, plan_batches};
use super::deduplication::{DeduplicationGate, PersistOutcome};
use super::direct_extraction::{DirectExtractionError, DirectExtractor};
use super::header_extraction::extract_header;
use super::issuer_identification::identify_issuer;
use super::job_registry::JobRegistry;
use super::pipeline_settings::{ExtractionStrategy, PipelineSettings};
use super::prompts::{batch_prompt, direct_prompt};
use super::redaction::Redactor;
use super::segmentation::{
    SegmentationError, request_skeleton, segment_by_anchors, segment_by_marker,
};
use super::worker_pool::{WorkerError, WorkerPool};

pub const PROGRESS_TEXT_EXTRACTED: u8 = 20;
pub const PROGRESS_ISSUER_IDENTIFIED: u8 = 30;
pub const PROGRESS_SEGMENTED: u8 = 50;
pub const PROGRESS_EXTRACTED: u8 = 80;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("job input is no longer available")]
    InputUnavailable,
    #[error("job was cancelled")]
    Cancelled,
    #[error("text extraction failed: {0}")]
    TextExtraction(#[from] TextExtractionError),
    #[error("oracle call failed: {0}")]
    Oracle(#[from] OracleError),
    #[error("segmentation failed: {0}")]
    Segmentation(#[from] SegmentationError),
    #[error("batch extraction failed: {0}")]
    BatchExtraction(#[from] BatchExtractionError),
    #[error("extraction failed: {0}")]
    DirectExtraction(#[from] DirectExtractionError),
    #[error("artifact generation failed: {0}")]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Worker(#[from] WorkerError),
}

/// Runs one job through text extraction, redaction, issuer identification,
/// structured extraction, persistence and export.
///
/// The registry is the only place job state lives; the orchestrator reads the
/// job's input from it and reports every transition back to it. Cancellation
/// is polled before and after each stage.
pub struct PipelineOrchestrator {
    registry: Arc<JobRegistry>,
    oracles: Arc<dyn OracleResolver>,
    pdf_extractor: Arc<dyn TextExtractor>,
    plain_extractor: Arc<dyn TextExtractor>,
    references: Arc<dyn ReferenceLibrary>,
    renderer: Arc<dyn ArtifactRenderer>,
    dedup: DeduplicationGate,
    redactor: Redactor,
    workers: WorkerPool,
    settings: PipelineSettings,
}

impl PipelineOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<JobRegistry>,
        oracles: Arc<dyn OracleResolver>,
        pdf_extractor: Arc<dyn TextExtractor>,
        plain_extractor: Arc<dyn TextExtractor>,
        references: Arc<dyn ReferenceLibrary>,
        renderer: Arc<dyn ArtifactRenderer>,
        dedup: DeduplicationGate,
        redactor: Redactor,
        workers: WorkerPool,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            registry,
            oracles,
            pdf_extractor,
            plain_extractor,
            references,
            renderer,
            dedup,
            redactor,
            workers,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Spawns the pipeline for a freshly created job.
    pub fn start(self: &Arc<Self>, job_id: JobId) -> tokio::task::JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.run(job_id, None).await })
    }

    /// Replays the pipeline from the first stage with a password. Returns
    /// None when the job is not waiting for one.
    pub fn resubmit_with_password(
        self: &Arc<Self>,
        job_id: JobId,
        password: String,
    ) -> Option<tokio::task::JoinHandle<()>> {
        if !self.registry.reset_for_retry(job_id) {
            return None;
        }
        tracing::info!(job_id = %job_id, "Password submitted, replaying pipeline");

        let orchestrator = Arc::clone(self);
        Some(tokio::spawn(async move {
            orchestrator.run(job_id, Some(password)).await
        }))
    }

    /// Drives one job to a terminal or password-pending state. Nothing
    /// escapes this boundary: every failure becomes a single transition.
    pub async fn run(&self, job_id: JobId, password: Option<String>) {
        let (filename, provider) = self
            .registry
            .get(job_id)
            .map(|job| (job.filename, job.backend.provider))
            .unwrap_or_default();
        let span = tracing::info_span!(
            "pipeline_job",
            job_id = %job_id,
            filename = %filename,
            provider = %provider,
            strategy = %self.settings.strategy,
        );

        let result = self
            .process(job_id, password.as_deref())
            .instrument(span)
            .await;

        match result {
            Ok(()) => tracing::info!(job_id = %job_id, "Pipeline completed"),
            Err(PipelineError::Cancelled) => {
                tracing::info!(job_id = %job_id, "Pipeline stopped: job cancelled");
            }
            Err(PipelineError::TextExtraction(
                e @ (TextExtractionError::PasswordRequired | TextExtractionError::PasswordIncorrect),
            )) => {
                tracing::info!(job_id = %job_id, reason = %e, "Pipeline paused: password required");
                self.registry.set_password_required(job_id, e.to_string());
            }
            Err(e) if self.registry.is_cancelled(job_id) => {
                tracing::info!(job_id = %job_id, error = %e, "Failure after cancellation suppressed");
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Pipeline failed");
                self.registry.set_error(job_id, e.to_string());
            }
        }
    }

    async fn process(&self, job_id: JobId, password: Option<&str>) -> Result<(), PipelineError> {
        self.checkpoint(job_id)?;

        let job = self
            .registry
            .get(job_id)
            .ok_or(PipelineError::JobNotFound(job_id))?;
        let input = self
            .registry
            .input(job_id)
            .ok_or(PipelineError::InputUnavailable)?;
        self.registry
            .update_status(job_id, JobStatus::Processing, Some(0));

        let oracle = self.oracles.resolve(&job.backend.provider)?;
        self.checkpoint(job_id)?;

        let document = self.extract_text(input, password).await?;
        self.registry
            .update_progress(job_id, PROGRESS_TEXT_EXTRACTED);
        self.checkpoint(job_id)?;

        let first_page = document.first_page_text().to_string();
        let redactor = self.redactor.clone();
        let text: Arc<str> = self
            .workers
            .run_blocking(move || redactor.redact(&document.combined_text()))
            .await?
            .into();
        self.registry
            .set_details(job_id, text.to_string(), String::new());
        self.checkpoint(job_id)?;

        let issuer = {
            let oracle = Arc::clone(&oracle);
            let first_page = self.redactor.redact(&first_page);
            let threshold = self.settings.issuer_confidence_threshold;
            self.workers
                .run(async move { identify_issuer(oracle.as_ref(), &first_page, threshold).await })
                .await?
        };
        self.registry
            .update_progress(job_id, PROGRESS_ISSUER_IDENTIFIED);
        self.checkpoint(job_id)?;

        let reference = if issuer.is_unknown() {
            None
        } else {
            let references = Arc::clone(&self.references);
            let issuer_name = issuer.name.clone();
            self.workers
                .run(async move { references.reference_for(&issuer_name).await })
                .await?
        };
        self.checkpoint(job_id)?;

        let mut result = self
            .extract_records(job_id, oracle, Arc::clone(&text), reference)
            .await?;
        result.label_issuer(&issuer.name);
        self.registry
            .update_progress(job_id, PROGRESS_EXTRACTED);
        self.checkpoint(job_id)?;

        let outcome = {
            let dedup = self.dedup.clone();
            let filename = job.filename.clone();
            let issuer_name = issuer.name.clone();
            let records = result.clone();
            self.workers
                .run(async move { dedup.persist(job_id, &filename, &issuer_name, &records).await })
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Persistence task failed");
                    PersistOutcome::Failed
                })
        };
        tracing::debug!(outcome = ?outcome, "Persistence finished");
        self.checkpoint(job_id)?;

        let artifact_path = self.write_artifact(result).await?;
        self.checkpoint(job_id)?;

        self.registry.set_completed(job_id, artifact_path);
        Ok(())
    }

    async fn extract_text(
        &self,
        input: JobInput,
        password: Option<&str>,
    ) -> Result<ExtractedDocument, PipelineError> {
        let password = password.map(str::to_owned);
        let (extractor, bytes) = match input {
            JobInput::Pdf(bytes) => (Arc::clone(&self.pdf_extractor), bytes),
            JobInput::Text(text) => (
                Arc::clone(&self.plain_extractor),
                bytes::Bytes::copy_from_slice(text.as_bytes()),
            ),
        };

        let document = self
            .workers
            .run(async move { extractor.extract_text(&bytes, password.as_deref()).await })
            .await??;

        tracing::info!(pages = document.pages.len(), "Text extracted");
        Ok(document)
    }

    async fn extract_records(
        &self,
        job_id: JobId,
        oracle: Arc<dyn ExtractionOracle>,
        text: Arc<str>,
        reference: Option<String>,
    ) -> Result<ExtractionResult, PipelineError> {
        if self.settings.strategy == ExtractionStrategy::Direct {
            self.registry.set_details(
                job_id,
                text.to_string(),
                direct_prompt(&text, reference.as_deref()),
            );
            self.registry.update_progress(job_id, PROGRESS_SEGMENTED);
            self.checkpoint(job_id)?;

            let extractor = DirectExtractor::new(self.settings.low_confidence_threshold);
            let text = text.to_string();
            let result = self
                .workers
                .run(async move { extractor.extract(oracle, text, reference).await })
                .await??;
            return Ok(result);
        }

        let header = {
            let oracle = Arc::clone(&oracle);
            let text = Arc::clone(&text);
            self.workers
                .run(async move { extract_header(oracle.as_ref(), &text).await })
                .await??
        };
        self.checkpoint(job_id)?;

        let blocks = self.segment(Arc::clone(&oracle), Arc::clone(&text)).await?;
        tracing::info!(blocks = blocks.len(), "Document segmented");

        let diagnostic_prompt = plan_batches(&blocks, self.settings.batch_size)
            .first()
            .map(|batch| batch_prompt(batch, reference.as_deref()))
            .unwrap_or_default();
        self.registry
            .set_details(job_id, text.to_string(), diagnostic_prompt);
        self.registry.update_progress(job_id, PROGRESS_SEGMENTED);
        self.checkpoint(job_id)?;

        let coordinator = BatchCoordinator::new(self.settings.batch_size);
        let items = self
            .workers
            .run(async move { coordinator.extract(oracle, blocks, reference).await })
            .await??;

        Ok(ExtractionResult::new(header, items))
    }

    async fn segment(
        &self,
        oracle: Arc<dyn ExtractionOracle>,
        text: Arc<str>,
    ) -> Result<Vec<String>, PipelineError> {
        match self.settings.strategy {
            ExtractionStrategy::Anchor => {
                let skeleton = {
                    let text = Arc::clone(&text);
                    self.workers
                        .run(async move { request_skeleton(oracle.as_ref(), &text).await })
                        .await??
                };
                let settings = self.settings.anchor;
                Ok(self
                    .workers
                    .run_blocking(move || segment_by_anchors(&text, &skeleton, &settings))
                    .await??)
            }
            _ => {
                let marker = self.settings.item_marker.clone();
                Ok(self
                    .workers
                    .run_blocking(move || segment_by_marker(&text, &marker))
                    .await??)
            }
        }
    }

    /// Renders the spreadsheet and stores it under the hash of its bytes.
    async fn write_artifact(&self, result: ExtractionResult) -> Result<PathBuf, PipelineError> {
        let renderer = Arc::clone(&self.renderer);
        let bytes = self
            .workers
            .run_blocking(move || renderer.render(&result))
            .await??;

        let digest = format!("{:x}", Sha256::digest(&bytes));
        let dir = self.settings.artifact_dir.clone();
        let path = dir.join(format!("{digest}.xlsx"));

        let target = path.clone();
        self.workers
            .run(async move {
                tokio::fs::create_dir_all(&dir).await?;
                tokio::fs::write(&target, &bytes).await
            })
            .await?
            .map_err(ArtifactError::from)?;

        tracing::info!(path = %path.display(), "Artifact written");
        Ok(path)
    }

    fn checkpoint(&self, job_id: JobId) -> Result<(), PipelineError> {
        if self.registry.is_cancelled(job_id) {
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }
}
