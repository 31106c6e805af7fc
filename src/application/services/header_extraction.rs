use serde_json::Value;

use crate::application::ports::{ExtractionOracle, OracleError};
use crate::domain::DocumentHeader;

use super::item_parsing::{json_payload, parse_header};
use super::prompts::{HEADER_SYSTEM_PROMPT, header_prompt};

/// One oracle call for the document-level fields of a segmented document.
pub async fn extract_header(
    oracle: &dyn ExtractionOracle,
    text: &str,
) -> Result<DocumentHeader, OracleError> {
    let content = oracle.chat(HEADER_SYSTEM_PROMPT, &header_prompt(text)).await?;
    let value: Value = serde_json::from_str(json_payload(&content))
        .map_err(|e| OracleError::InvalidResponse(format!("header: {e}")))?;

    if !value.is_object() {
        return Err(OracleError::InvalidResponse(
            "header: expected a JSON object".to_string(),
        ));
    }
    Ok(parse_header(&value))
}
