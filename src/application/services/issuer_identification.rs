use serde::Deserialize;

use crate::application::ports::ExtractionOracle;
use crate::domain::IssuerIdentification;

use super::item_parsing::json_payload;
use super::prompts::{ISSUER_SYSTEM_PROMPT, issuer_prompt};

pub const DEFAULT_ISSUER_CONFIDENCE_THRESHOLD: f64 = 0.5;

#[derive(Deserialize)]
struct IssuerAnswer {
    name: Option<String>,
    confidence: Option<f64>,
}

/// Names the issuer of a document from its first page. Never fails: any
/// oracle or parsing problem, and any answer below `min_confidence`, yields
/// `Unknown`.
#[tracing::instrument(skip_all)]
pub async fn identify_issuer(
    oracle: &dyn ExtractionOracle,
    first_page: &str,
    min_confidence: f64,
) -> IssuerIdentification {
    if first_page.trim().is_empty() {
        return IssuerIdentification::unknown();
    }

    let content = match oracle.chat(ISSUER_SYSTEM_PROMPT, &issuer_prompt(first_page)).await {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(error = %e, "Issuer identification failed");
            return IssuerIdentification::unknown();
        }
    };

    let identification = parse_issuer_answer(&content, min_confidence);
    tracing::info!(issuer = %identification.name, confidence = identification.confidence, "Issuer identified");
    identification
}

pub fn parse_issuer_answer(content: &str, min_confidence: f64) -> IssuerIdentification {
    let Ok(answer) = serde_json::from_str::<IssuerAnswer>(json_payload(content)) else {
        return IssuerIdentification::unknown();
    };

    let name = answer.name.map(|n| n.trim().to_string()).unwrap_or_default();
    let confidence = answer.confidence.unwrap_or(0.0).clamp(0.0, 1.0);

    if name.is_empty() || confidence < min_confidence {
        return IssuerIdentification::unknown();
    }
    IssuerIdentification::new(name, confidence)
}
