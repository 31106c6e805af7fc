use std::path::PathBuf;

use invoice_extractor::domain::{Job, JobInput, JobStatus, OracleBackend};

fn new_job() -> Job {
    Job::new(
        0,
        "cupom.pdf".to_string(),
        OracleBackend::new("offline", "llama3.1:8b"),
        JobInput::pdf(b"%PDF-1.7".to_vec()),
    )
}

#[test]
fn given_new_job_when_created_then_waiting_with_input_retained() {
    let job = new_job();

    assert_eq!(job.status, JobStatus::Waiting);
    assert_eq!(job.progress, 0);
    assert!(job.input.is_some());
    assert!(job.finished_at.is_none());
    assert!(!job.cancelled);
}

#[test]
fn given_processing_job_when_progress_goes_backwards_then_progress_is_kept() {
    let mut job = new_job();
    job.set_status(JobStatus::Processing, Some(50));

    job.set_progress(20);

    assert_eq!(job.progress, 50);
}

#[test]
fn given_progress_above_hundred_when_advancing_then_clamped() {
    let mut job = new_job();

    job.set_progress(250);

    assert_eq!(job.progress, 100);
}

#[test]
fn given_terminal_target_when_setting_status_then_rejected() {
    let mut job = new_job();

    assert!(!job.set_status(JobStatus::Completed, Some(100)));
    assert_eq!(job.status, JobStatus::Waiting);
}

#[test]
fn given_completed_job_when_mutated_then_nothing_changes() {
    let mut job = new_job();
    assert!(job.complete(PathBuf::from("/tmp/out.xlsx")));
    let finished_at = job.finished_at;

    assert!(!job.fail("late failure".to_string()));
    assert!(!job.cancel());
    assert!(!job.set_status(JobStatus::Processing, Some(10)));
    assert!(!job.set_details("text".to_string(), "prompt".to_string()));
    assert!(!job.require_password("locked".to_string()));

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert!(job.error_message.is_none());
    assert_eq!(job.finished_at, finished_at);
}

#[test]
fn given_failed_job_when_failed_then_input_released_and_finish_time_set() {
    let mut job = new_job();

    assert!(job.fail("oracle unreachable".to_string()));

    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.error_message.as_deref(), Some("oracle unreachable"));
    assert!(job.input.is_none());
    assert!(job.finished_at.is_some());
}

#[test]
fn given_processing_job_when_cancelled_then_flag_and_status_set() {
    let mut job = new_job();
    job.set_status(JobStatus::Processing, Some(30));

    assert!(job.cancel());

    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(job.cancelled);
    assert!(job.input.is_none());
    assert!(job.finished_at.is_some());
}

#[test]
fn given_password_pending_job_when_cancelled_then_rejected() {
    let mut job = new_job();
    job.require_password("password required".to_string());

    assert!(!job.cancel());
    assert_eq!(job.status, JobStatus::PasswordRequired);
}

#[test]
fn given_password_pending_job_when_reset_for_retry_then_processing_from_zero() {
    let mut job = new_job();
    job.set_status(JobStatus::Processing, Some(20));
    job.set_details("text".to_string(), String::new());
    job.require_password("password required".to_string());

    assert!(job.reset_for_retry());

    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.progress, 0);
    assert!(job.error_message.is_none());
    assert!(job.extracted_text.is_none());
    assert!(job.input.is_some());
}

#[test]
fn given_processing_job_when_reset_for_retry_then_rejected() {
    let mut job = new_job();
    job.set_status(JobStatus::Processing, Some(20));

    assert!(!job.reset_for_retry());
    assert_eq!(job.progress, 20);
}
