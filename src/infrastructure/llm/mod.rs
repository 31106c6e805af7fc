mod mock_oracle;
mod ollama_client;
mod openai_client;
mod oracle_factory;

pub use mock_oracle::{MockOracle, MockOracleResolver, OracleGate};
pub use ollama_client::OllamaClient;
pub use openai_client::OpenAiClient;
pub use oracle_factory::{OFFLINE_PROVIDER, ONLINE_PROVIDER, OracleFactory};
