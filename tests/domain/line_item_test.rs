use invoice_extractor::domain::{
    DEFAULT_CURRENCY, DocumentHeader, ExtractionResult, LineItem,
};

#[test]
fn given_new_item_when_created_then_defaults_apply() {
    let item = LineItem::new("ARROZ 5KG", 2.0, 21.9, 43.8);

    assert_eq!(item.currency, DEFAULT_CURRENCY);
    assert_eq!(item.discount, 0.0);
    assert!(item.issuer.is_none());
}

#[test]
fn given_items_without_confidence_when_averaging_then_they_count_as_confident() {
    let mut scored = LineItem::new("A", 1.0, 1.0, 1.0);
    scored.confidence = Some(0.5);
    let result = ExtractionResult::new(
        DocumentHeader::default(),
        vec![scored, LineItem::new("B", 1.0, 1.0, 1.0)],
    );

    assert!((result.average_confidence() - 0.75).abs() < f64::EPSILON);
}

#[test]
fn given_no_items_when_averaging_then_fully_confident() {
    assert_eq!(ExtractionResult::default().average_confidence(), 1.0);
}

#[test]
fn given_issuer_when_labelling_then_every_item_carries_it() {
    let mut result = ExtractionResult::new(
        DocumentHeader::default(),
        vec![
            LineItem::new("A", 1.0, 1.0, 1.0),
            LineItem::new("B", 1.0, 2.0, 2.0),
        ],
    );

    result.label_issuer("Nubank");

    assert!(
        result
            .items
            .iter()
            .all(|item| item.issuer.as_deref() == Some("Nubank"))
    );
}
