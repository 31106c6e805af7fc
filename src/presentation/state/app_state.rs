use std::sync::Arc;

use crate::application::ports::OracleResolver;
use crate::application::services::{JobRegistry, PipelineOrchestrator};

/// Shared handler state. The registry is the one constructed at startup and
/// handed to the orchestrator as well.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<JobRegistry>,
    pub orchestrator: Arc<PipelineOrchestrator>,
    pub oracles: Arc<dyn OracleResolver>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<PipelineOrchestrator>,
        oracles: Arc<dyn OracleResolver>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            registry: Arc::clone(orchestrator.registry()),
            orchestrator,
            oracles,
            max_upload_bytes,
        }
    }
}
