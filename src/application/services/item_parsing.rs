use serde_json::Value;

use crate::domain::{DEFAULT_CURRENCY, DocumentHeader, LineItem};

pub const REQUIRED_ITEM_FIELDS: [&str; 4] = ["description", "quantity", "unit_price", "total"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ItemError {
    #[error("item {index} is not an object")]
    NotAnObject { index: usize },
    #[error("item {index} is missing required field {field:?}")]
    MissingField { index: usize, field: &'static str },
    #[error("item {index} has a non-numeric {field:?}: {value}")]
    InvalidNumber {
        index: usize,
        field: &'static str,
        value: String,
    },
    #[error("item {index} has a non-text {field:?}")]
    InvalidText { index: usize, field: &'static str },
}

/// Trims markdown code fences and any prose around the JSON payload of an
/// oracle answer.
pub fn json_payload(content: &str) -> &str {
    let trimmed = content.trim();
    let start = trimmed.find(['{', '[']);
    let end = trimmed.rfind(['}', ']']);
    match (start, end) {
        (Some(start), Some(end)) if start <= end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Returns the item list of an answer shaped either as `{"items": [...]}` or
/// as a bare array.
pub fn items_array(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("items").and_then(Value::as_array),
        _ => None,
    }
}

/// Converts one oracle item into a `LineItem`. Required fields must be present
/// and non-null; nothing is defaulted to hide a malformed answer.
pub fn parse_item(index: usize, value: &Value) -> Result<LineItem, ItemError> {
    let object = value.as_object().ok_or(ItemError::NotAnObject { index })?;

    for field in REQUIRED_ITEM_FIELDS {
        if object.get(field).is_none_or(Value::is_null) {
            return Err(ItemError::MissingField { index, field });
        }
    }

    let description = match &object["description"] {
        Value::String(s) => s.clone(),
        _ => {
            return Err(ItemError::InvalidText {
                index,
                field: "description",
            });
        }
    };

    Ok(LineItem {
        description,
        quantity: number(index, "quantity", &object["quantity"])?,
        unit_price: number(index, "unit_price", &object["unit_price"])?,
        total: number(index, "total", &object["total"])?,
        discount: match object.get("discount") {
            Some(v) if !v.is_null() => number(index, "discount", v)?,
            _ => 0.0,
        },
        code: optional_text(object.get("code")),
        date: optional_text(object.get("date")),
        installment: optional_text(object.get("installment")),
        currency: optional_text(object.get("currency"))
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        page: object
            .get("page")
            .and_then(Value::as_u64)
            .and_then(|p| u32::try_from(p).ok()),
        confidence: object
            .get("confidence")
            .and_then(Value::as_f64)
            .map(|c| c.clamp(0.0, 1.0)),
        issuer: None,
    })
}

pub fn parse_items(values: &[Value]) -> Result<Vec<LineItem>, ItemError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| parse_item(index, value))
        .collect()
}

/// Reads header fields from an answer object. Absent or non-text fields stay
/// unset; legacy Portuguese-era keys are accepted as aliases.
pub fn parse_header(value: &Value) -> DocumentHeader {
    let field = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| optional_text(value.get(*key)))
    };

    DocumentHeader {
        merchant_name: field(&["merchant_name", "market_name"]),
        tax_id: field(&["tax_id", "cnpj"]),
        address: field(&["address"]),
        access_key: field(&["access_key"]),
        issue_date: field(&["issue_date", "purchase_date"]),
    }
}

/// Accepts JSON numbers and decimal-comma strings; amounts are absolute.
fn number(index: usize, field: &'static str, value: &Value) -> Result<f64, ItemError> {
    let invalid = || ItemError::InvalidNumber {
        index,
        field,
        value: value.to_string(),
    };

    let parsed = match value {
        Value::Number(n) => n.as_f64().ok_or_else(invalid)?,
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    if !parsed.is_finite() {
        return Err(invalid());
    }
    Ok(parsed.abs())
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
