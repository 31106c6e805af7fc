//! Prompt construction for every oracle call the pipeline makes.

use crate::domain::ExtractionBatch;

pub const ISSUER_SYSTEM_PROMPT: &str =
    "You are a financial document issuer identification system. Return only valid JSON.";
pub const HEADER_SYSTEM_PROMPT: &str =
    "You are a receipt header extraction system. Return only valid JSON.";
pub const SKELETON_SYSTEM_PROMPT: &str =
    "You are a text segmentation system. Return only valid JSON.";
pub const BATCH_SYSTEM_PROMPT: &str =
    "You are a line item extraction system. Return only valid JSON.";
pub const DIRECT_SYSTEM_PROMPT: &str =
    "You are a financial data extraction system. Return only valid JSON.";

pub const ITEM_BEGIN: &str = "<<<ITEM";
pub const ITEM_END: &str = "<<<END ITEM";

const ITEM_SCHEMA: &str = r#"{"description": string, "code": string|null, "quantity": number, "unit_price": number, "total": number, "discount": number, "date": string|null, "installment": string|null, "currency": string, "page": number|null, "confidence": number}"#;

pub fn issuer_prompt(first_page: &str) -> String {
    format!(
        "Identify the bank, card issuer or merchant that issued this document.\n\
         Answer as {{\"name\": string, \"confidence\": number between 0 and 1}}.\n\n\
         Document:\n{first_page}"
    )
}

pub fn header_prompt(text: &str) -> String {
    format!(
        "Extract the document header fields.\n\
         Answer as {{\"merchant_name\": string|null, \"tax_id\": string|null, \"address\": string|null, \
         \"access_key\": string|null, \"issue_date\": string|null}}.\n\n\
         Document:\n{text}"
    )
}

pub fn skeleton_prompt(text: &str) -> String {
    format!(
        "Split the document into its line items. For every item, in document order, copy the \
         exact text that starts it and the exact text that ends it.\n\
         Answer as {{\"items\": [{{\"sequence\": number, \"start_anchor\": string, \"end_anchor\": string}}]}}.\n\n\
         Document:\n{text}"
    )
}

pub fn batch_prompt(batch: &ExtractionBatch, reference: Option<&str>) -> String {
    let mut prompt = format!(
        "Each block between {ITEM_BEGIN} n>>> and {ITEM_END} n>>> describes exactly one line item.\n\
         Return {{\"items\": [...]}} with exactly {} objects, one per block, in block order, \
         each shaped as {ITEM_SCHEMA}.\n",
        batch.expected_count()
    );
    append_reference(&mut prompt, reference);
    prompt.push('\n');
    prompt.push_str(&render_blocks(batch));
    prompt
}

pub fn direct_prompt(text: &str, reference: Option<&str>) -> String {
    let mut prompt = format!(
        "Extract every line item of the document.\n\
         Answer as {{\"merchant_name\": string|null, \"tax_id\": string|null, \"address\": string|null, \
         \"access_key\": string|null, \"issue_date\": string|null, \"items\": [{ITEM_SCHEMA}]}}.\n"
    );
    append_reference(&mut prompt, reference);
    prompt.push_str("\nDocument:\n");
    prompt.push_str(text);
    prompt
}

/// Serializes blocks with explicit numbered delimiters.
pub fn render_blocks(batch: &ExtractionBatch) -> String {
    batch
        .blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let n = i + 1;
            format!("{ITEM_BEGIN} {n}>>>\n{block}\n{ITEM_END} {n}>>>")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn append_reference(prompt: &mut String, reference: Option<&str>) {
    if let Some(reference) = reference.filter(|r| !r.trim().is_empty()) {
        prompt.push_str("\nIssuer reference:\n");
        prompt.push_str(reference);
        prompt.push('\n');
    }
}
