use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::application::ports::{ExtractionOracle, OracleError, OracleResolver};
use crate::domain::OracleBackend;

type Script = VecDeque<Result<String, OracleError>>;

/// Pauses calls for one system prompt until the test releases them.
#[derive(Default)]
pub struct OracleGate {
    pub entered: Notify,
    pub release: Notify,
}

/// Scripted oracle keyed by system prompt. Queued answers are consumed in
/// order; the last one repeats.
#[derive(Default)]
pub struct MockOracle {
    scripts: Mutex<HashMap<String, Script>>,
    gates: Mutex<HashMap<String, Arc<OracleGate>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, system_prompt: &str, content: impl Into<String>) -> Self {
        self.push(system_prompt, Ok(content.into()));
        self
    }

    pub fn fail(self, system_prompt: &str, error: OracleError) -> Self {
        self.push(system_prompt, Err(error));
        self
    }

    pub fn gate(&self, system_prompt: &str) -> Arc<OracleGate> {
        let gate = Arc::new(OracleGate::default());
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(system_prompt.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self, system_prompt: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(system, _)| system == system_prompt)
            .count()
    }

    fn push(&self, system_prompt: &str, answer: Result<String, OracleError>) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(system_prompt.to_string())
            .or_default()
            .push_back(answer);
    }

    fn next_answer(&self, system_prompt: &str) -> Result<String, OracleError> {
        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(script) = scripts.get_mut(system_prompt) else {
            return Err(OracleError::InvalidResponse(format!(
                "no scripted answer for system prompt {system_prompt:?}"
            )));
        };
        match script.len() {
            0 => Err(OracleError::EmptyResponse("mock".to_string())),
            1 => script[0].clone(),
            _ => script
                .pop_front()
                .unwrap_or_else(|| Err(OracleError::EmptyResponse("mock".to_string()))),
        }
    }
}

#[async_trait]
impl ExtractionOracle for MockOracle {
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, OracleError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((system_prompt.to_string(), user_prompt.to_string()));

        let gate = self
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(system_prompt)
            .cloned();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        self.next_answer(system_prompt)
    }
}

/// Resolves every provider to the same oracle.
pub struct MockOracleResolver {
    oracle: Arc<dyn ExtractionOracle>,
}

impl MockOracleResolver {
    pub fn new(oracle: Arc<dyn ExtractionOracle>) -> Self {
        Self { oracle }
    }
}

impl OracleResolver for MockOracleResolver {
    fn backend(&self, provider: &str) -> OracleBackend {
        OracleBackend::new(provider, "mock")
    }

    fn resolve(&self, _provider: &str) -> Result<Arc<dyn ExtractionOracle>, OracleError> {
        Ok(Arc::clone(&self.oracle))
    }
}
