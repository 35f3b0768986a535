use aws_smithy_types::{Document, Number};
use serde_json::json;

use distress_bedrock::document::{document_to_json, json_to_document};

#[test]
fn numbers_keep_their_kind() {
    assert_eq!(json_to_document(&json!(3)), Document::Number(Number::PosInt(3)));
    assert_eq!(json_to_document(&json!(-3)), Document::Number(Number::NegInt(-3)));
    assert_eq!(json_to_document(&json!(0.5)), Document::Number(Number::Float(0.5)));
}

#[test]
fn nested_values_survive_conversion() {
    let value = json!({
        "evidence_spans": [{ "text": "quote", "reason": "why" }],
        "safety_flag": false,
        "qc_notes": null
    });
    assert_eq!(document_to_json(&json_to_document(&value)), value);
}

#[test]
fn non_finite_float_becomes_null() {
    let doc = Document::Number(Number::Float(f64::NAN));
    assert_eq!(document_to_json(&doc), serde_json::Value::Null);
}
