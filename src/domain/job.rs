use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::{JobId, JobInput, JobStatus, OracleBackend};

#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub sequence: u64,
    pub filename: String,
    pub backend: OracleBackend,
    pub status: JobStatus,
    pub progress: u8,
    pub input: Option<JobInput>,
    pub extracted_text: Option<String>,
    pub prompt: Option<String>,
    pub error_message: Option<String>,
    pub artifact_path: Option<PathBuf>,
    pub cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(sequence: u64, filename: String, backend: OracleBackend, input: JobInput) -> Self {
        Self {
            id: JobId::new(),
            sequence,
            filename,
            backend,
            status: JobStatus::Waiting,
            progress: 0,
            input: Some(input),
            extracted_text: None,
            prompt: None,
            error_message: None,
            artifact_path: None,
            cancelled: false,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        let end = self.finished_at.unwrap_or(now);
        (end - self.created_at).num_seconds().max(0)
    }

    // Transition rules. Each returns whether the job changed; a terminal job
    // never changes.

    pub fn set_status(&mut self, status: JobStatus, progress: Option<u8>) -> bool {
        if self.is_terminal() || status.is_terminal() {
            return false;
        }
        self.status = status;
        if let Some(progress) = progress {
            self.advance_progress(progress);
        }
        true
    }

    pub fn set_progress(&mut self, progress: u8) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.advance_progress(progress);
        true
    }

    pub fn set_details(&mut self, extracted_text: String, prompt: String) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.extracted_text = Some(extracted_text);
        self.prompt = Some(prompt);
        true
    }

    pub fn fail(&mut self, message: String) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Error;
        self.error_message = Some(message);
        self.input = None;
        self.finished_at = Some(Utc::now());
        true
    }

    pub fn complete(&mut self, artifact_path: PathBuf) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.artifact_path = Some(artifact_path);
        self.input = None;
        self.finished_at = Some(Utc::now());
        true
    }

    /// Parks the job until a password is supplied. The input is kept so the
    /// pipeline can be replayed.
    pub fn require_password(&mut self, message: String) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = JobStatus::PasswordRequired;
        self.error_message = Some(message);
        true
    }

    pub fn reset_for_retry(&mut self) -> bool {
        if self.status != JobStatus::PasswordRequired || self.input.is_none() {
            return false;
        }
        self.status = JobStatus::Processing;
        self.progress = 0;
        self.error_message = None;
        self.extracted_text = None;
        self.prompt = None;
        true
    }

    pub fn cancel(&mut self) -> bool {
        if !self.status.is_cancellable() {
            return false;
        }
        self.status = JobStatus::Cancelled;
        self.cancelled = true;
        self.input = None;
        self.finished_at = Some(Utc::now());
        true
    }

    fn advance_progress(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
    }
}
