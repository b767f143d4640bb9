use report_core::{FieldValue, JobRequest, DEFAULT_MODEL};

#[test]
fn blank_model_falls_back_to_default() {
    assert_eq!(JobRequest::new("  ").model(), DEFAULT_MODEL);
    assert_eq!(JobRequest::new(" gpt-4o ").model(), "gpt-4o");
}

#[test]
fn multi_valued_fields_are_comma_joined_and_model_is_last() {
    let request = JobRequest::new("gpt-5")
        .with_field("product", vec!["Wine".to_string(), " ".to_string(), "Olive oil".to_string()])
        .with_field("brand", "Acme")
        .with_field("ai_model", "ignored");

    assert_eq!(
        request.form_pairs(),
        vec![
            ("brand".to_string(), "Acme".to_string()),
            ("product".to_string(), "Wine,Olive oil".to_string()),
            ("ai_model".to_string(), "gpt-5".to_string()),
        ]
    );
    assert_eq!(
        request.field("brand"),
        Some(&FieldValue::Single("Acme".to_string()))
    );
}
