mod batch_coordinator;
mod deduplication;
mod direct_extraction;
mod header_extraction;
mod issuer_identification;
mod item_parsing;
mod job_registry;
mod pipeline_orchestrator;
mod pipeline_settings;
mod prompts;
mod redaction;
pub mod segmentation;
mod worker_pool;

pub use batch_coordinator::{
    BatchCoordinator, BatchExtractionError, DEFAULT_BATCH_SIZE, parse_batch_response, plan_batches,
};
pub use deduplication::{
    CanonicalRecordSet, DeduplicationGate, PersistOutcome, canonical_item, canonicalize,
    content_hash, normalize_amount, normalize_text,
};
pub use direct_extraction::{
    DEFAULT_LOW_CONFIDENCE_THRESHOLD, DirectExtractionError, DirectExtractor,
    parse_direct_response,
};
pub use header_extraction::extract_header;
pub use issuer_identification::{
    DEFAULT_ISSUER_CONFIDENCE_THRESHOLD, identify_issuer, parse_issuer_answer,
};
pub use item_parsing::{ItemError, REQUIRED_ITEM_FIELDS, parse_header, parse_item};
pub use job_registry::{DEFAULT_SUBSCRIBER_CAPACITY, JobRegistry, SubscriberId, Subscription};
pub use pipeline_orchestrator::{
    PROGRESS_EXTRACTED, PROGRESS_ISSUER_IDENTIFIED, PROGRESS_SEGMENTED, PROGRESS_TEXT_EXTRACTED,
    PipelineError, PipelineOrchestrator,
};
pub use pipeline_settings::{ExtractionStrategy, PipelineSettings};
pub use prompts::{
    BATCH_SYSTEM_PROMPT, DIRECT_SYSTEM_PROMPT, HEADER_SYSTEM_PROMPT, ISSUER_SYSTEM_PROMPT,
    SKELETON_SYSTEM_PROMPT,
};
pub use redaction::Redactor;
pub use segmentation::SegmentationError;
pub use worker_pool::{DEFAULT_MAX_CONCURRENCY, WorkerError, WorkerPool};
