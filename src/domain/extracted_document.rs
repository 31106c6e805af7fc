#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

/// Normalized text of a source document, page by page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub pages: Vec<PageText>,
}

impl ExtractedDocument {
    pub fn new(pages: Vec<PageText>) -> Self {
        Self { pages }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            pages: vec![PageText {
                number: 1,
                text: text.into(),
            }],
        }
    }

    pub fn first_page_text(&self) -> &str {
        self.pages.first().map(|p| p.text.as_str()).unwrap_or("")
    }

    pub fn combined_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| format!("--- PAGE {} ---\n{}", p.number, p.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
