mod mock_text_extractor;
mod pdfium_text_extractor;
mod plain_text_extractor;
mod text_sanitizer;

pub use mock_text_extractor::MockTextExtractor;
pub use pdfium_text_extractor::PdfiumTextExtractor;
pub use plain_text_extractor::PlainTextExtractor;
pub use text_sanitizer::normalize_page_text;
