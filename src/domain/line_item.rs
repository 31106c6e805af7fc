use serde::{Deserialize, Serialize};

/// One extracted record: a receipt item or a statement transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub installment: Option<String>,
    pub currency: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub issuer: Option<String>,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: f64, unit_price: f64, total: f64) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            total,
            discount: 0.0,
            code: None,
            date: None,
            installment: None,
            currency: DEFAULT_CURRENCY.to_string(),
            page: None,
            confidence: None,
            issuer: None,
        }
    }
}

pub const DEFAULT_CURRENCY: &str = "BRL";

/// Document-level fields printed once per receipt or statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHeader {
    pub merchant_name: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub access_key: Option<String>,
    pub issue_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub header: DocumentHeader,
    pub items: Vec<LineItem>,
}

impl ExtractionResult {
    pub fn new(header: DocumentHeader, items: Vec<LineItem>) -> Self {
        Self { header, items }
    }

    /// Mean item confidence; items without a score count as fully confident.
    pub fn average_confidence(&self) -> f64 {
        if self.items.is_empty() {
            return 1.0;
        }
        let sum: f64 = self
            .items
            .iter()
            .map(|item| item.confidence.unwrap_or(1.0))
            .sum();
        sum / self.items.len() as f64
    }

    pub fn label_issuer(&mut self, issuer: &str) {
        for item in &mut self.items {
            item.issuer = Some(issuer.to_string());
        }
    }
}
