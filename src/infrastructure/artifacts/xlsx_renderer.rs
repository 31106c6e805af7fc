use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::application::ports::{ArtifactError, ArtifactRenderer};
use crate::domain::ExtractionResult;

const SHEET_NAME: &str = "Items";
const AMOUNT_FORMAT: &str = "#,##0.00";

const COLUMNS: [(&str, f64); 17] = [
    ("Issuer", 18.0),
    ("Merchant", 25.0),
    ("Tax ID", 18.0),
    ("Address", 40.0),
    ("Access Key", 50.0),
    ("Issue Date", 12.0),
    ("Code", 15.0),
    ("Description", 40.0),
    ("Date", 12.0),
    ("Installment", 10.0),
    ("Quantity", 10.0),
    ("Unit Price", 12.0),
    ("Total", 12.0),
    ("Discount", 10.0),
    ("Currency", 8.0),
    ("Page", 6.0),
    ("Confidence", 10.0),
];

/// Writes one row per item, repeating the document header on every row so
/// the sheet can be filtered and pivoted directly.
#[derive(Debug, Default)]
pub struct XlsxRenderer;

impl XlsxRenderer {
    pub fn new() -> Self {
        Self
    }

    fn build(result: &ExtractionResult) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        let bold = Format::new().set_bold();
        let amount = Format::new().set_num_format(AMOUNT_FORMAT);

        for (col, (title, width)) in COLUMNS.iter().enumerate() {
            let col = col as u16;
            sheet.write_string_with_format(0, col, *title, &bold)?;
            sheet.set_column_width(col, *width)?;
        }

        let header = &result.header;
        for (index, item) in result.items.iter().enumerate() {
            let row = index as u32 + 1;
            let text_cells = [
                item.issuer.as_deref(),
                header.merchant_name.as_deref(),
                header.tax_id.as_deref(),
                header.address.as_deref(),
                header.access_key.as_deref(),
                header.issue_date.as_deref(),
                item.code.as_deref(),
                Some(item.description.as_str()),
                item.date.as_deref(),
                item.installment.as_deref(),
            ];
            for (col, value) in text_cells.into_iter().enumerate() {
                write_optional(sheet, row, col as u16, value)?;
            }

            sheet.write_number(row, 10, item.quantity)?;
            sheet.write_number_with_format(row, 11, item.unit_price, &amount)?;
            sheet.write_number_with_format(row, 12, item.total, &amount)?;
            sheet.write_number_with_format(row, 13, item.discount, &amount)?;
            sheet.write_string(row, 14, &item.currency)?;
            if let Some(page) = item.page {
                sheet.write_number(row, 15, page)?;
            }
            if let Some(confidence) = item.confidence {
                sheet.write_number(row, 16, confidence)?;
            }
        }

        if !result.items.is_empty() {
            sheet.autofilter(0, 0, result.items.len() as u32, COLUMNS.len() as u16 - 1)?;
        }

        workbook.save_to_buffer()
    }
}

fn write_optional(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<&str>,
) -> Result<(), XlsxError> {
    if let Some(value) = value {
        sheet.write_string(row, col, value)?;
    }
    Ok(())
}

impl ArtifactRenderer for XlsxRenderer {
    fn render(&self, result: &ExtractionResult) -> Result<Vec<u8>, ArtifactError> {
        Self::build(result).map_err(|e| ArtifactError::RenderFailed(e.to_string()))
    }
}
