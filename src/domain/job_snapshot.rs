use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Job;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wire shape of a job, emitted to subscribers and returned by queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub id: String,
    pub filename: String,
    pub provider: String,
    pub model_name: String,
    pub status: String,
    pub progress: u8,
    pub created_at: String,
    pub finished_at: Option<String>,
    pub elapsed_seconds: i64,
    pub elapsed_time: String,
    pub error_message: Option<String>,
    pub has_artifact: bool,
    pub extracted_text: Option<String>,
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl JobSnapshot {
    pub fn capture(job: &Job, now: DateTime<Utc>) -> Self {
        let elapsed_seconds = job.elapsed_seconds(now);
        let model_name = if job.backend.model_name.is_empty() {
            job.backend.provider.clone()
        } else {
            job.backend.model_name.clone()
        };

        Self {
            id: job.id.to_string(),
            filename: job.filename.clone(),
            provider: job.backend.provider.clone(),
            model_name,
            status: job.status.as_str().to_string(),
            progress: job.progress,
            created_at: job.created_at.format(TIMESTAMP_FORMAT).to_string(),
            finished_at: job
                .finished_at
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
            elapsed_seconds,
            elapsed_time: format_elapsed_time(elapsed_seconds),
            error_message: job.error_message.clone(),
            has_artifact: job.artifact_path.is_some(),
            extracted_text: job.extracted_text.clone(),
            prompt: job.prompt.clone(),
            download_url: job
                .artifact_path
                .as_ref()
                .map(|_| format!("/jobs/{}/download", job.id)),
        }
    }
}

impl From<&Job> for JobSnapshot {
    fn from(job: &Job) -> Self {
        Self::capture(job, Utc::now())
    }
}

pub fn format_elapsed_time(seconds: i64) -> String {
    let seconds = seconds.max(0);
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {:02}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {:02}m", seconds / 3600, (seconds % 3600) / 60)
    }
}
