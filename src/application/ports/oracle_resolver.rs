use std::sync::Arc;

use crate::domain::OracleBackend;

use super::{ExtractionOracle, OracleError};

/// Maps a provider identifier chosen at job creation to a concrete oracle.
pub trait OracleResolver: Send + Sync {
    fn backend(&self, provider: &str) -> OracleBackend;

    fn resolve(&self, provider: &str) -> Result<Arc<dyn ExtractionOracle>, OracleError>;
}
