mod content_hash;
mod extracted_document;
mod issuer;
mod job;
mod job_id;
mod job_input;
mod job_snapshot;
mod job_status;
mod line_item;
mod oracle_backend;
mod skeleton;

pub use content_hash::ContentHash;
pub use extracted_document::{ExtractedDocument, PageText};
pub use issuer::{IssuerIdentification, UNKNOWN_ISSUER};
pub use job::Job;
pub use job_id::JobId;
pub use job_input::JobInput;
pub use job_snapshot::{JobSnapshot, format_elapsed_time};
pub use job_status::JobStatus;
pub use line_item::{DEFAULT_CURRENCY, DocumentHeader, ExtractionResult, LineItem};
pub use oracle_backend::OracleBackend;
pub use skeleton::{ExtractionBatch, SkeletonItem};
