use std::path::PathBuf;

use chrono::Duration;
use invoice_extractor::domain::{
    Job, JobInput, JobSnapshot, OracleBackend, format_elapsed_time,
};

fn new_job(backend: OracleBackend) -> Job {
    Job::new(
        0,
        "fatura.pdf".to_string(),
        backend,
        JobInput::text("Fatura"),
    )
}

#[test]
fn given_elapsed_seconds_when_formatting_then_compact_units() {
    assert_eq!(format_elapsed_time(0), "0s");
    assert_eq!(format_elapsed_time(59), "59s");
    assert_eq!(format_elapsed_time(61), "1m 01s");
    assert_eq!(format_elapsed_time(3600), "1h 00m");
    assert_eq!(format_elapsed_time(3725), "1h 02m");
    assert_eq!(format_elapsed_time(-5), "0s");
}

#[test]
fn given_running_job_when_captured_then_elapsed_measured_to_now() {
    let job = new_job(OracleBackend::new("offline", "llama3.1:8b"));
    let now = job.created_at + Duration::seconds(75);

    let snapshot = JobSnapshot::capture(&job, now);

    assert_eq!(snapshot.status, "WAITING");
    assert_eq!(snapshot.elapsed_seconds, 75);
    assert_eq!(snapshot.elapsed_time, "1m 15s");
    assert!(snapshot.finished_at.is_none());
    assert!(!snapshot.has_artifact);
    assert!(snapshot.download_url.is_none());
}

#[test]
fn given_finished_job_when_captured_later_then_elapsed_is_frozen() {
    let mut job = new_job(OracleBackend::new("offline", "llama3.1:8b"));
    job.fail("boom".to_string());
    let finished_at = job.finished_at.unwrap();

    let snapshot = JobSnapshot::capture(&job, finished_at + Duration::hours(2));

    assert_eq!(
        snapshot.elapsed_seconds,
        (finished_at - job.created_at).num_seconds()
    );
    assert_eq!(snapshot.error_message.as_deref(), Some("boom"));
}

#[test]
fn given_completed_job_when_captured_then_download_url_is_exposed() {
    let mut job = new_job(OracleBackend::new("online", "gpt-4o-mini"));
    job.complete(PathBuf::from("/tmp/abc.xlsx"));

    let snapshot = JobSnapshot::from(&job);

    assert!(snapshot.has_artifact);
    assert_eq!(snapshot.progress, 100);
    assert_eq!(
        snapshot.download_url,
        Some(format!("/jobs/{}/download", job.id))
    );
}

#[test]
fn given_backend_without_model_when_captured_then_provider_is_shown() {
    let job = new_job(OracleBackend::new("custom", ""));

    let snapshot = JobSnapshot::from(&job);

    assert_eq!(snapshot.model_name, "custom");
}

#[test]
fn given_snapshot_without_artifact_when_serialized_then_download_url_is_omitted() {
    let job = new_job(OracleBackend::new("offline", "llama3.1:8b"));

    let json = serde_json::to_value(JobSnapshot::from(&job)).unwrap();

    assert!(json.get("download_url").is_none());
    assert_eq!(json["status"], "WAITING");
    assert_eq!(json["filename"], "fatura.pdf");
}
