mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    DatabaseSettings, ExtractionSettings, LlmSettings, LoggingSettings, RegistrySettings,
    ServerSettings, Settings, StorageSettings, WorkerSettings,
};
