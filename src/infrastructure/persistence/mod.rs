mod in_memory_extraction_store;
mod pg_extraction_store;
mod pg_pool;

pub use in_memory_extraction_store::InMemoryExtractionStore;
pub use pg_extraction_store::PgExtractionStore;
pub use pg_pool::{create_pool, ensure_schema};
