mod artifact_renderer;
mod extraction_store;
mod oracle;
mod oracle_resolver;
mod reference_library;
mod repository_error;
mod text_extractor;

pub use artifact_renderer::{ArtifactError, ArtifactRenderer};
pub use extraction_store::{CanonicalItem, ExtractionDocument, ExtractionStore};
pub use oracle::{ExtractionOracle, OracleError};
pub use oracle_resolver::OracleResolver;
pub use reference_library::ReferenceLibrary;
pub use repository_error::RepositoryError;
pub use text_extractor::{TextExtractionError, TextExtractor};
