use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use invoice_extractor::application::ports::{OracleError, ReferenceLibrary};
use invoice_extractor::application::services::{
    BATCH_SYSTEM_PROMPT, DIRECT_SYSTEM_PROMPT, ExtractionStrategy, HEADER_SYSTEM_PROMPT,
    ISSUER_SYSTEM_PROMPT, SKELETON_SYSTEM_PROMPT,
};
use invoice_extractor::domain::{JobStatus, UNKNOWN_ISSUER};
use invoice_extractor::infrastructure::llm::MockOracle;
use invoice_extractor::infrastructure::persistence::InMemoryExtractionStore;
use invoice_extractor::infrastructure::reference::FsReferenceLibrary;
use invoice_extractor::infrastructure::text_processing::MockTextExtractor;

use crate::support::{
    TestPipelineBuilder, item_json, items_answer, numbered_items, receipt_oracle, receipt_text,
    settings,
};

#[tokio::test]
async fn given_receipt_with_22_items_when_pipeline_runs_then_completed_with_artifact() {
    let artifacts = TempDir::new().unwrap();
    let pipeline = TestPipelineBuilder::new(
        receipt_oracle(22, 10),
        settings(artifacts.path(), ExtractionStrategy::Marker, 10),
    )
    .build();
    let job = pipeline.create_text_job(&receipt_text(22));

    pipeline.run_to_end(job.id).await;

    let job = pipeline.registry.get(job.id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert!(job.error_message.is_none());
    assert!(job.input.is_none());
    assert!(job.finished_at.is_some());
    let artifact = job.artifact_path.unwrap();
    assert!(artifact.starts_with(artifacts.path()));
    assert!(std::fs::read(&artifact).unwrap().starts_with(b"PK"));

    assert_eq!(pipeline.oracle.call_count(BATCH_SYSTEM_PROMPT), 3);
    assert_eq!(pipeline.store.len(), 1);
    let document = &pipeline.store.documents()[0];
    assert_eq!(document.items.len(), 22);
    assert_eq!(document.issuer, "Mercado Central");
    assert_eq!(
        document.header.merchant_name.as_deref(),
        Some("MERCADO CENTRAL LTDA")
    );
}

#[tokio::test]
async fn given_running_pipeline_when_observed_then_progress_never_decreases() {
    let artifacts = TempDir::new().unwrap();
    let pipeline = TestPipelineBuilder::new(
        receipt_oracle(5, 10),
        settings(artifacts.path(), ExtractionStrategy::Marker, 10),
    )
    .build();
    let mut subscription = pipeline.registry.subscribe();
    let job = pipeline.create_text_job(&receipt_text(5));

    pipeline.run_to_end(job.id).await;

    let mut progress = Vec::new();
    let mut statuses = Vec::new();
    while let Ok(event) = subscription.receiver.try_recv() {
        let snapshot: serde_json::Value = serde_json::from_str(&event).unwrap();
        progress.push(snapshot["progress"].as_u64().unwrap());
        statuses.push(snapshot["status"].as_str().unwrap().to_string());
    }
    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(statuses.first().map(String::as_str), Some("WAITING"));
    assert_eq!(statuses.last().map(String::as_str), Some("COMPLETED"));
    assert_eq!(progress.last(), Some(&100));
}

#[tokio::test]
async fn given_short_batch_answer_when_pipeline_runs_then_error_without_artifact() {
    let artifacts = TempDir::new().unwrap();
    let oracle = receipt_oracle(0, 10)
        .respond(BATCH_SYSTEM_PROMPT, numbered_items(1..=2));
    let pipeline = TestPipelineBuilder::new(
        oracle,
        settings(artifacts.path(), ExtractionStrategy::Marker, 10),
    )
    .build();
    let job = pipeline.create_text_job(&receipt_text(3));

    pipeline.run_to_end(job.id).await;

    let job = pipeline.registry.get(job.id).unwrap();
    assert_eq!(job.status, JobStatus::Error);
    let message = job.error_message.unwrap();
    assert!(message.contains("expected 3 items, got 2"), "{message}");
    assert!(job.artifact_path.is_none());
    assert!(pipeline.store.is_empty());
    assert_eq!(std::fs::read_dir(artifacts.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn given_same_receipt_twice_when_pipeline_runs_then_persisted_once() {
    let artifacts = TempDir::new().unwrap();
    let pipeline = TestPipelineBuilder::new(
        receipt_oracle(3, 10),
        settings(artifacts.path(), ExtractionStrategy::Marker, 10),
    )
    .build();
    let first = pipeline.create_text_job(&receipt_text(3));
    let second = pipeline.create_text_job(&receipt_text(3));

    pipeline.run_to_end(first.id).await;
    pipeline.run_to_end(second.id).await;

    assert_eq!(
        pipeline.registry.get(first.id).unwrap().status,
        JobStatus::Completed
    );
    assert_eq!(
        pipeline.registry.get(second.id).unwrap().status,
        JobStatus::Completed
    );
    assert_eq!(pipeline.store.len(), 1);
    assert_eq!(pipeline.store.documents()[0].job_id, first.id);
}

#[tokio::test]
async fn given_unavailable_store_when_pipeline_runs_then_job_still_completes() {
    let artifacts = TempDir::new().unwrap();
    let pipeline = TestPipelineBuilder::new(
        receipt_oracle(3, 10),
        settings(artifacts.path(), ExtractionStrategy::Marker, 10),
    )
    .store(Arc::new(InMemoryExtractionStore::unavailable()))
    .build();
    let job = pipeline.create_text_job(&receipt_text(3));

    pipeline.run_to_end(job.id).await;

    let job = pipeline.registry.get(job.id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.artifact_path.is_some());
}

#[tokio::test]
async fn given_cancel_during_batch_call_when_call_returns_then_cancelled_without_error() {
    let artifacts = TempDir::new().unwrap();
    let pipeline = TestPipelineBuilder::new(
        receipt_oracle(5, 10),
        settings(artifacts.path(), ExtractionStrategy::Marker, 10),
    )
    .build();
    let gate = pipeline.oracle.gate(BATCH_SYSTEM_PROMPT);
    let job = pipeline.create_text_job(&receipt_text(5));

    let handle = pipeline.orchestrator.start(job.id);
    tokio::time::timeout(Duration::from_secs(10), gate.entered.notified())
        .await
        .expect("batch call never started");
    assert!(pipeline.registry.cancel(job.id));
    gate.release.notify_one();
    tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .unwrap()
        .unwrap();

    let job = pipeline.registry.get(job.id).unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(job.cancelled);
    assert!(job.error_message.is_none());
    assert!(job.artifact_path.is_none());
    assert!(pipeline.store.is_empty());
}

#[tokio::test]
async fn given_cancelled_job_when_pipeline_starts_then_no_oracle_call_is_made() {
    let artifacts = TempDir::new().unwrap();
    let pipeline = TestPipelineBuilder::new(
        receipt_oracle(3, 10),
        settings(artifacts.path(), ExtractionStrategy::Marker, 10),
    )
    .build();
    let job = pipeline.create_text_job(&receipt_text(3));
    assert!(pipeline.registry.cancel(job.id));

    pipeline.run_to_end(job.id).await;

    assert_eq!(
        pipeline.registry.get(job.id).unwrap().status,
        JobStatus::Cancelled
    );
    assert!(pipeline.oracle.calls().is_empty());
}

#[tokio::test]
async fn given_protected_pdf_when_password_supplied_then_pipeline_replays_to_completion() {
    let artifacts = TempDir::new().unwrap();
    let extractor = MockTextExtractor::single_page(receipt_text(3)).with_password("s3cret");
    let pipeline = TestPipelineBuilder::new(
        receipt_oracle(3, 10),
        settings(artifacts.path(), ExtractionStrategy::Marker, 10),
    )
    .pdf_extractor(Arc::new(extractor))
    .build();
    let job = pipeline.create_pdf_job(b"%PDF-1.7 encrypted");

    pipeline.run_to_end(job.id).await;
    let parked = pipeline.registry.get(job.id).unwrap();
    assert_eq!(parked.status, JobStatus::PasswordRequired);
    assert!(parked.error_message.is_some());
    assert!(parked.input.is_some());
    assert!(pipeline.oracle.calls().is_empty());

    pipeline
        .orchestrator
        .resubmit_with_password(job.id, "wrong".to_string())
        .unwrap()
        .await
        .unwrap();
    let rejected = pipeline.registry.get(job.id).unwrap();
    assert_eq!(rejected.status, JobStatus::PasswordRequired);
    assert!(rejected.error_message.unwrap().contains("incorrect"));

    pipeline
        .orchestrator
        .resubmit_with_password(job.id, "s3cret".to_string())
        .unwrap()
        .await
        .unwrap();
    let job = pipeline.registry.get(job.id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.artifact_path.is_some());
}

#[tokio::test]
async fn given_job_not_waiting_for_password_when_resubmitting_then_refused() {
    let artifacts = TempDir::new().unwrap();
    let pipeline = TestPipelineBuilder::new(
        receipt_oracle(3, 10),
        settings(artifacts.path(), ExtractionStrategy::Marker, 10),
    )
    .build();
    let job = pipeline.create_text_job(&receipt_text(3));

    assert!(
        pipeline
            .orchestrator
            .resubmit_with_password(job.id, "s3cret".to_string())
            .is_none()
    );
    assert_eq!(
        pipeline.registry.get(job.id).unwrap().status,
        JobStatus::Waiting
    );
}

#[tokio::test]
async fn given_sensitive_terms_when_pipeline_runs_then_oracle_never_sees_them() {
    let artifacts = TempDir::new().unwrap();
    let pipeline = TestPipelineBuilder::new(
        receipt_oracle(3, 10),
        settings(artifacts.path(), ExtractionStrategy::Marker, 10),
    )
    .build();
    let job = pipeline.create_text_job(&receipt_text(3));

    pipeline.run_to_end(job.id).await;

    let calls = pipeline.oracle.calls();
    assert!(!calls.is_empty());
    assert!(
        calls
            .iter()
            .all(|(_, prompt)| !prompt.to_lowercase().contains("cpf"))
    );
    let job = pipeline.registry.get(job.id).unwrap();
    assert!(!job.extracted_text.unwrap().contains("CPF"));
    assert!(!job.prompt.unwrap_or_default().contains("CPF"));
}

#[tokio::test]
async fn given_issuer_oracle_failure_when_pipeline_runs_then_issuer_is_unknown() {
    let artifacts = TempDir::new().unwrap();
    let oracle = MockOracle::new()
        .fail(ISSUER_SYSTEM_PROMPT, OracleError::Transport("timeout".to_string()))
        .respond(HEADER_SYSTEM_PROMPT, "{}")
        .respond(BATCH_SYSTEM_PROMPT, numbered_items(1..=3));
    let pipeline = TestPipelineBuilder::new(
        oracle,
        settings(artifacts.path(), ExtractionStrategy::Marker, 10),
    )
    .build();
    let job = pipeline.create_text_job(&receipt_text(3));

    pipeline.run_to_end(job.id).await;

    assert_eq!(
        pipeline.registry.get(job.id).unwrap().status,
        JobStatus::Completed
    );
    assert_eq!(pipeline.store.documents()[0].issuer, UNKNOWN_ISSUER);
}

#[tokio::test]
async fn given_identified_issuer_with_reference_when_extracting_then_prompts_include_it() {
    let artifacts = TempDir::new().unwrap();
    let knowledge = TempDir::new().unwrap();
    std::fs::write(
        knowledge.path().join("mercado.md"),
        "Item codes are the first three digits.",
    )
    .unwrap();
    let references = FsReferenceLibrary::new(
        knowledge.path(),
        HashMap::from([("Mercado Central".to_string(), "mercado.md".to_string())]),
    );
    let pipeline = TestPipelineBuilder::new(
        receipt_oracle(3, 10),
        settings(artifacts.path(), ExtractionStrategy::Marker, 10),
    )
    .references(Arc::new(references))
    .build();
    let job = pipeline.create_text_job(&receipt_text(3));

    pipeline.run_to_end(job.id).await;

    let batch_prompts: Vec<String> = pipeline
        .oracle
        .calls()
        .into_iter()
        .filter(|(system, _)| system == BATCH_SYSTEM_PROMPT)
        .map(|(_, prompt)| prompt)
        .collect();
    assert_eq!(batch_prompts.len(), 1);
    assert!(batch_prompts[0].contains("Item codes are the first three digits."));
    let job = pipeline.registry.get(job.id).unwrap();
    assert!(job.prompt.unwrap().contains("Item codes are the first three digits."));
}

#[tokio::test]
async fn given_anchor_strategy_when_pipeline_runs_then_skeleton_drives_segmentation() {
    let artifacts = TempDir::new().unwrap();
    let skeleton = r#"{"items": [
        {"sequence": 1, "start_anchor": "001 PRODUTO 1", "end_anchor": "Vl. Total 1,00"},
        {"sequence": 2, "start_anchor": "002 PRODUTO 2", "end_anchor": "Vl. Total 2,00"},
        {"sequence": 3, "start_anchor": "003 PRODUTO 3", "end_anchor": "Vl. Total 3,00"}
    ]}"#;
    let oracle = receipt_oracle(3, 10).respond(SKELETON_SYSTEM_PROMPT, skeleton);
    let pipeline = TestPipelineBuilder::new(
        oracle,
        settings(artifacts.path(), ExtractionStrategy::Anchor, 10),
    )
    .build();
    let job = pipeline.create_text_job(&receipt_text(3));

    pipeline.run_to_end(job.id).await;

    assert_eq!(
        pipeline.registry.get(job.id).unwrap().status,
        JobStatus::Completed
    );
    assert_eq!(pipeline.oracle.call_count(SKELETON_SYSTEM_PROMPT), 1);
    assert_eq!(pipeline.store.documents()[0].items.len(), 3);
}

#[tokio::test]
async fn given_unresolvable_skeleton_when_pipeline_runs_then_job_fails() {
    let artifacts = TempDir::new().unwrap();
    let skeleton = r#"[{"start_anchor": "ESTORNO INTERNACIONAL", "end_anchor": "FIM"}]"#;
    let oracle = receipt_oracle(3, 10).respond(SKELETON_SYSTEM_PROMPT, skeleton);
    let pipeline = TestPipelineBuilder::new(
        oracle,
        settings(artifacts.path(), ExtractionStrategy::Anchor, 10),
    )
    .build();
    let job = pipeline.create_text_job(&receipt_text(3));

    pipeline.run_to_end(job.id).await;

    let job = pipeline.registry.get(job.id).unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert!(job.error_message.unwrap().starts_with("segmentation failed"));
    assert_eq!(pipeline.oracle.call_count(BATCH_SYSTEM_PROMPT), 0);
}

#[tokio::test]
async fn given_low_confidence_direct_answer_when_extracting_then_one_reattempt_is_used() {
    let artifacts = TempDir::new().unwrap();
    let oracle = MockOracle::new()
        .respond(ISSUER_SYSTEM_PROMPT, r#"{"name": "Nubank", "confidence": 0.95}"#)
        .respond(
            DIRECT_SYSTEM_PROMPT,
            items_answer(&[item_json("PRIMEIRA LEITURA", 10.0, 0.4)]),
        )
        .respond(
            DIRECT_SYSTEM_PROMPT,
            items_answer(&[item_json("SEGUNDA LEITURA", 10.0, 0.9)]),
        );
    let pipeline = TestPipelineBuilder::new(
        oracle,
        settings(artifacts.path(), ExtractionStrategy::Direct, 10),
    )
    .build();
    let job = pipeline.create_text_job("NUBANK\nFatura\nPADARIA 10,00\n");

    pipeline.run_to_end(job.id).await;

    assert_eq!(
        pipeline.registry.get(job.id).unwrap().status,
        JobStatus::Completed
    );
    assert_eq!(pipeline.oracle.call_count(DIRECT_SYSTEM_PROMPT), 2);
    assert_eq!(pipeline.oracle.call_count(BATCH_SYSTEM_PROMPT), 0);
    assert_eq!(
        pipeline.store.documents()[0].items[0].description,
        "SEGUNDA LEITURA"
    );
}

#[tokio::test]
async fn given_confident_direct_answer_when_extracting_then_no_reattempt() {
    let artifacts = TempDir::new().unwrap();
    let oracle = MockOracle::new()
        .respond(ISSUER_SYSTEM_PROMPT, r#"{"name": "Nubank", "confidence": 0.95}"#)
        .respond(
            DIRECT_SYSTEM_PROMPT,
            items_answer(&[item_json("PADARIA", 10.0, 0.95)]),
        );
    let pipeline = TestPipelineBuilder::new(
        oracle,
        settings(artifacts.path(), ExtractionStrategy::Direct, 10),
    )
    .build();
    let job = pipeline.create_text_job("NUBANK\nFatura\nPADARIA 10,00\n");

    pipeline.run_to_end(job.id).await;

    assert_eq!(pipeline.oracle.call_count(DIRECT_SYSTEM_PROMPT), 1);
    assert_eq!(
        pipeline.registry.get(job.id).unwrap().status,
        JobStatus::Completed
    );
}

struct BrokenReferenceLibrary;

#[async_trait]
impl ReferenceLibrary for BrokenReferenceLibrary {
    async fn reference_for(&self, _issuer: &str) -> Option<String> {
        panic!("reference store crashed");
    }
}

#[tokio::test]
async fn given_reference_lookup_crashing_when_pipeline_runs_then_job_fails_cleanly() {
    let artifacts = TempDir::new().unwrap();
    let pipeline = TestPipelineBuilder::new(
        receipt_oracle(3, 10),
        settings(artifacts.path(), ExtractionStrategy::Marker, 10),
    )
    .references(Arc::new(BrokenReferenceLibrary))
    .build();
    let job = pipeline.create_text_job(&receipt_text(3));

    pipeline.run_to_end(job.id).await;

    let job = pipeline.registry.get(job.id).unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert!(job.error_message.unwrap().contains("worker task failed"));
    assert!(pipeline.store.documents().is_empty());
}
