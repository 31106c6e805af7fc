use invoice_extractor::application::ports::{TextExtractionError, TextExtractor};
use invoice_extractor::infrastructure::text_processing::MockTextExtractor;

#[tokio::test]
async fn given_protected_document_without_password_when_extracting_then_password_required() {
    let extractor = MockTextExtractor::single_page("Fatura").with_password("s3cret");

    let result = extractor.extract_text(b"%PDF", None).await;

    assert_eq!(result, Err(TextExtractionError::PasswordRequired));
}

#[tokio::test]
async fn given_wrong_password_when_extracting_then_password_incorrect() {
    let extractor = MockTextExtractor::single_page("Fatura").with_password("s3cret");

    let result = extractor.extract_text(b"%PDF", Some("guess")).await;

    assert_eq!(result, Err(TextExtractionError::PasswordIncorrect));
}

#[tokio::test]
async fn given_pages_when_extracting_then_numbered_from_one() {
    let extractor = MockTextExtractor::new(vec!["one".to_string(), "two".to_string()]);

    let document = extractor.extract_text(b"%PDF", None).await.unwrap();

    assert_eq!(document.pages[0].number, 1);
    assert_eq!(document.pages[1].number, 2);
    assert_eq!(document.pages[1].text, "two");
}
