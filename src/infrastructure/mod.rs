pub mod artifacts;
pub mod llm;
pub mod observability;
pub mod persistence;
pub mod reference;
pub mod text_processing;
