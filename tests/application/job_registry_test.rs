use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc::error::TryRecvError;

use invoice_extractor::application::services::JobRegistry;
use invoice_extractor::domain::{JobId, JobInput, JobStatus, OracleBackend};

fn create(registry: &JobRegistry, filename: &str) -> JobId {
    registry
        .create(
            filename.to_string(),
            OracleBackend::new("offline", "llama3.1:8b"),
            JobInput::text("Vl. Total 1,00"),
        )
        .id
}

#[test]
fn given_created_jobs_when_listing_then_newest_first() {
    let registry = JobRegistry::default();
    let first = create(&registry, "a.pdf");
    let second = create(&registry, "b.pdf");
    let third = create(&registry, "c.pdf");

    let ids: Vec<JobId> = registry.list().iter().map(|job| job.id).collect();

    assert_eq!(ids, vec![third, second, first]);
}

#[test]
fn given_unknown_id_when_mutating_then_nothing_happens() {
    let registry = JobRegistry::default();

    assert!(!registry.cancel(JobId::new()));
    assert!(!registry.reset_for_retry(JobId::new()));
    assert!(registry.get(JobId::new()).is_none());
    assert!(!registry.is_cancelled(JobId::new()));
}

#[test]
fn given_completed_job_when_failing_then_stays_completed() {
    let registry = JobRegistry::default();
    let id = create(&registry, "a.pdf");
    registry.set_completed(id, PathBuf::from("/tmp/a.xlsx"));

    registry.set_error(id, "late failure");

    let job = registry.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.error_message.is_none());
    assert!(registry.input(id).is_none());
}

#[test]
fn given_processing_job_when_cancelled_then_flag_is_visible_and_input_released() {
    let registry = JobRegistry::default();
    let id = create(&registry, "a.pdf");
    registry.update_status(id, JobStatus::Processing, Some(20));

    assert!(registry.cancel(id));

    assert!(registry.is_cancelled(id));
    assert!(registry.input(id).is_none());
    assert!(!registry.cancel(id));
}

#[test]
fn given_password_pending_job_when_cancelling_then_refused() {
    let registry = JobRegistry::default();
    let id = create(&registry, "locked.pdf");
    registry.set_password_required(id, "password required");

    assert!(!registry.cancel(id));
    assert_eq!(registry.get(id).unwrap().status, JobStatus::PasswordRequired);
    assert!(registry.input(id).is_some());
}

#[tokio::test]
async fn given_subscriber_when_job_changes_then_snapshot_event_is_received() {
    let registry = JobRegistry::default();
    let mut subscription = registry.subscribe();
    let id = create(&registry, "a.pdf");

    registry.update_status(id, JobStatus::Processing, Some(20));

    let created: serde_json::Value =
        serde_json::from_str(&subscription.receiver.recv().await.unwrap()).unwrap();
    let updated: serde_json::Value =
        serde_json::from_str(&subscription.receiver.recv().await.unwrap()).unwrap();
    assert_eq!(created["id"], id.to_string());
    assert_eq!(created["status"], "WAITING");
    assert_eq!(updated["status"], "PROCESSING");
    assert_eq!(updated["progress"], 20);
}

#[test]
fn given_rejected_transition_when_applied_then_no_event_is_emitted() {
    let registry = JobRegistry::default();
    let id = create(&registry, "a.pdf");
    registry.set_completed(id, PathBuf::from("/tmp/a.xlsx"));
    let mut subscription = registry.subscribe();

    registry.update_progress(id, 10);

    assert_eq!(subscription.receiver.try_recv(), Err(TryRecvError::Empty));
}

#[test]
fn given_full_subscriber_when_emitting_then_event_is_dropped_and_subscriber_kept() {
    let registry = JobRegistry::new(1);
    let mut subscription = registry.subscribe();

    let first = create(&registry, "a.pdf");
    create(&registry, "b.pdf");

    let event: serde_json::Value =
        serde_json::from_str(&subscription.receiver.try_recv().unwrap()).unwrap();
    assert_eq!(event["id"], first.to_string());
    assert_eq!(subscription.receiver.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(registry.subscriber_count(), 1);
    assert_eq!(registry.list().len(), 2);
}

#[test]
fn given_dropped_receiver_when_emitting_then_subscriber_is_pruned() {
    let registry = JobRegistry::default();
    let subscription = registry.subscribe();
    drop(subscription);

    create(&registry, "a.pdf");

    assert_eq!(registry.subscriber_count(), 0);
}

#[test]
fn given_subscriber_when_unsubscribing_twice_then_second_call_is_harmless() {
    let registry = JobRegistry::default();
    let kept = registry.subscribe();
    let removed = registry.subscribe();

    registry.unsubscribe(removed.id);
    registry.unsubscribe(removed.id);

    assert_eq!(registry.subscriber_count(), 1);
    drop(kept);
}

#[test]
fn given_progress_racing_cancel_when_draining_events_then_last_event_is_cancelled() {
    for _ in 0..200 {
        let registry = Arc::new(JobRegistry::new(256));
        let id = create(&registry, "a.pdf");
        registry.update_status(id, JobStatus::Processing, Some(0));
        let mut subscription = registry.subscribe();

        let worker = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for progress in 1..100 {
                    registry.update_progress(id, progress);
                }
            })
        };
        assert!(registry.cancel(id));
        worker.join().unwrap();

        let mut last = None;
        while let Ok(event) = subscription.receiver.try_recv() {
            last = Some(event);
        }
        let last: serde_json::Value = serde_json::from_str(&last.unwrap()).unwrap();
        assert_eq!(registry.get(id).unwrap().status, JobStatus::Cancelled);
        assert_eq!(last["status"], "CANCELLED");
    }
}
