mod error;
mod events;
mod health;
mod jobs;

pub use error::{ErrorResponse, error_response};
pub use events::job_events_handler;
pub use health::health_handler;
pub use jobs::{
    PasswordRequest, TextJobRequest, cancel_job_handler, create_job_handler,
    create_text_job_handler, download_artifact_handler, get_job_handler, list_jobs_handler,
    submit_password_handler,
};
