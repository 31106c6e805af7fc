use serde::{Deserialize, Serialize};

pub const UNKNOWN_ISSUER: &str = "Unknown";

/// Outcome of issuer identification. `Unknown` is a regular value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerIdentification {
    pub name: String,
    pub confidence: f64,
}

impl IssuerIdentification {
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_ISSUER, 0.0)
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_ISSUER
    }
}

impl Default for IssuerIdentification {
    fn default() -> Self {
        Self::unknown()
    }
}
