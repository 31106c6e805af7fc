use std::path::Path as FsPath;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::domain::{JobId, JobInput, JobSnapshot, JobStatus};
use crate::infrastructure::llm::OFFLINE_PROVIDER;
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

use super::error::error_response;

const PDF_MAGIC: &[u8] = b"%PDF";
const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Deserialize)]
pub struct TextJobRequest {
    pub text: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

/// Accepts a multipart upload with a `file` part holding a PDF and an
/// optional `provider` part.
#[tracing::instrument(skip(state, multipart))]
pub async fn create_job_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut upload: Option<(String, Bytes)> = None;
    let mut provider = OFFLINE_PROVIDER.to_string();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read multipart: {e}"),
                );
            }
        };

        match field.name() {
            Some("provider") => match field.text().await {
                Ok(value) if !value.trim().is_empty() => provider = value.trim().to_string(),
                Ok(_) => {}
                Err(e) => {
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read provider: {e}"),
                    );
                }
            },
            Some("file") => {
                let filename = field.file_name().unwrap_or("document.pdf").to_string();
                match field.bytes().await {
                    Ok(data) => upload = Some((filename, data)),
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read file: {e}"),
                        );
                    }
                }
            }
            _ => {}
        }
    }

    let Some((filename, data)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    if data.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Uploaded file is empty");
    }
    if data.len() > state.max_upload_bytes {
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("File exceeds the {} byte upload limit", state.max_upload_bytes),
        );
    }
    if !data.starts_with(PDF_MAGIC) {
        return error_response(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Only PDF files are accepted");
    }

    tracing::debug!(filename = %filename, size = data.len(), provider = %provider, "PDF upload accepted");
    start_job(&state, filename, &provider, JobInput::pdf(data))
}

/// Creates a job from already-extracted text, such as an OCR import.
#[tracing::instrument(skip(state, request))]
pub async fn create_text_job_handler(
    State(state): State<AppState>,
    Json(request): Json<TextJobRequest>,
) -> Response {
    if request.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Text is empty");
    }
    if request.text.len() > state.max_upload_bytes {
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Text exceeds the {} byte upload limit", state.max_upload_bytes),
        );
    }

    tracing::debug!(text = %sanitize_prompt(&request.text), "Text import accepted");

    let filename = request
        .filename
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| "imported.txt".to_string());
    let provider = request
        .provider
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| OFFLINE_PROVIDER.to_string());

    start_job(&state, filename, &provider, JobInput::text(request.text))
}

fn start_job(state: &AppState, filename: String, provider: &str, input: JobInput) -> Response {
    let backend = state.oracles.backend(provider);
    let job = state.registry.create(filename, backend, input);
    state.orchestrator.start(job.id);

    (StatusCode::ACCEPTED, Json(JobSnapshot::from(&job))).into_response()
}

pub async fn list_jobs_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshots: Vec<JobSnapshot> = state.registry.list().iter().map(JobSnapshot::from).collect();
    Json(snapshots)
}

#[tracing::instrument(skip(state))]
pub async fn get_job_handler(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    let id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.registry.get(id) {
        Some(job) => (StatusCode::OK, Json(JobSnapshot::from(&job))).into_response(),
        None => not_found(&job_id),
    }
}

#[tracing::instrument(skip(state))]
pub async fn cancel_job_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let Some(job) = state.registry.get(id) else {
        return not_found(&job_id);
    };

    if !state.registry.cancel(id) {
        return error_response(
            StatusCode::CONFLICT,
            format!("Job in status {} cannot be cancelled", job.status),
        );
    }

    match state.registry.get(id) {
        Some(job) => (StatusCode::OK, Json(JobSnapshot::from(&job))).into_response(),
        None => not_found(&job_id),
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn submit_password_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(request): Json<PasswordRequest>,
) -> Response {
    let id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    if request.password.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Password is empty");
    }

    let Some(job) = state.registry.get(id) else {
        return not_found(&job_id);
    };

    if state
        .orchestrator
        .resubmit_with_password(id, request.password)
        .is_none()
    {
        return error_response(
            StatusCode::CONFLICT,
            format!("Job in status {} is not waiting for a password", job.status),
        );
    }

    match state.registry.get(id) {
        Some(job) => (StatusCode::ACCEPTED, Json(JobSnapshot::from(&job))).into_response(),
        None => not_found(&job_id),
    }
}

#[tracing::instrument(skip(state))]
pub async fn download_artifact_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let Some(job) = state.registry.get(id) else {
        return not_found(&job_id);
    };

    let (JobStatus::Completed, Some(path)) = (job.status, job.artifact_path.as_ref()) else {
        return error_response(StatusCode::NOT_FOUND, "No artifact available for this job");
    };

    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let disposition = format!("attachment; filename=\"{}\"", download_name(&job.filename));
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "Failed to read artifact");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Artifact could not be read")
        }
    }
}

fn download_name(filename: &str) -> String {
    let stem = FsPath::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("extraction");
    let safe: String = stem
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();
    format!("{safe}.xlsx")
}

fn parse_job_id(raw: &str) -> Result<JobId, Response> {
    raw.parse::<JobId>()
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, format!("Invalid job ID: {raw}")))
}

fn not_found(job_id: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("Job not found: {job_id}"))
}
