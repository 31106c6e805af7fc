use std::fmt;

/// Provider identifier plus the concrete model the provider resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleBackend {
    pub provider: String,
    pub model_name: String,
}

impl OracleBackend {
    pub fn new(provider: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model_name: model_name.into(),
        }
    }
}

impl fmt::Display for OracleBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.provider, self.model_name)
    }
}
