use std::sync::Arc;

use invoice_extractor::application::services::{
    DeduplicationGate, PersistOutcome, canonicalize, content_hash,
};
use invoice_extractor::domain::{DocumentHeader, ExtractionResult, JobId, LineItem};
use invoice_extractor::infrastructure::persistence::InMemoryExtractionStore;

fn receipt(items: Vec<LineItem>) -> ExtractionResult {
    ExtractionResult::new(
        DocumentHeader {
            merchant_name: Some("MERCADO CENTRAL LTDA".to_string()),
            tax_id: Some("12.345.678/0001-90".to_string()),
            ..DocumentHeader::default()
        },
        items,
    )
}

fn items() -> Vec<LineItem> {
    vec![
        LineItem::new("ARROZ 5KG", 1.0, 21.9, 21.9),
        LineItem::new("FEIJAO 1KG", 2.0, 8.49, 16.98),
    ]
}

#[tokio::test]
async fn given_same_extraction_twice_when_persisting_then_second_is_duplicate() {
    let store = Arc::new(InMemoryExtractionStore::new());
    let gate = DeduplicationGate::new(store.clone());

    let first = gate
        .persist(JobId::new(), "a.pdf", "Mercado Central", &receipt(items()))
        .await;
    let second = gate
        .persist(JobId::new(), "a-copy.pdf", "Mercado Central", &receipt(items()))
        .await;

    assert_eq!(first, PersistOutcome::Inserted);
    assert_eq!(second, PersistOutcome::Duplicate);
    assert_eq!(store.len(), 1);
    assert_eq!(store.documents()[0].filename, "a.pdf");
}

#[tokio::test]
async fn given_reordered_items_with_new_confidence_when_persisting_then_duplicate() {
    let store = Arc::new(InMemoryExtractionStore::new());
    let gate = DeduplicationGate::new(store.clone());
    let mut reordered = items();
    reordered.reverse();
    for item in &mut reordered {
        item.confidence = Some(0.42);
        item.page = Some(3);
    }

    gate.persist(JobId::new(), "a.pdf", "Mercado Central", &receipt(items()))
        .await;
    let outcome = gate
        .persist(JobId::new(), "b.pdf", "Unknown", &receipt(reordered))
        .await;

    assert_eq!(outcome, PersistOutcome::Duplicate);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn given_different_totals_when_persisting_then_both_are_stored() {
    let store = Arc::new(InMemoryExtractionStore::new());
    let gate = DeduplicationGate::new(store.clone());
    let mut changed = items();
    changed[1].total = 16.99;

    gate.persist(JobId::new(), "a.pdf", "Mercado Central", &receipt(items()))
        .await;
    let outcome = gate
        .persist(JobId::new(), "b.pdf", "Mercado Central", &receipt(changed))
        .await;

    assert_eq!(outcome, PersistOutcome::Inserted);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn given_unavailable_store_when_persisting_then_failure_is_reported_not_raised() {
    let gate = DeduplicationGate::new(Arc::new(InMemoryExtractionStore::unavailable()));

    let outcome = gate
        .persist(JobId::new(), "a.pdf", "Mercado Central", &receipt(items()))
        .await;

    assert_eq!(outcome, PersistOutcome::Failed);
}

#[test]
fn given_persisted_document_when_hashing_again_then_key_matches() {
    let result = receipt(items());

    let hash = content_hash(&canonicalize(&result));

    assert_eq!(hash, content_hash(&canonicalize(&result.clone())));
    assert!(hash.as_str().chars().all(|c| c.is_ascii_hexdigit()));
}
