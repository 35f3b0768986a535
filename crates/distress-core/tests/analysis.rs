use distress_core::models::analysis::{AnalysisResult, DistressLevel};
use distress_core::prompt::{REQUIRED_FIELDS, response_schema};

const PAYLOAD: &str = r#"
{
  "distress_level": "medium",
  "score": 0.62,
  "explanation_high_level": "The patient describes feeling overwhelmed and losing sleep.",
  "evidence_spans": [
    { "text": "I just feel so overwhelmed.", "reason": "Direct statement of being overwhelmed." }
  ],
  "recommendations": ["Offer a follow-up call.", "Share peer support resources.", "Suggest a sleep routine."],
  "safety_flag": false,
  "qc_notes": ""
}
"#;

#[test]
fn parses_schema_shaped_payload() {
    let result = AnalysisResult::from_json_str(PAYLOAD).expect("payload should parse");
    assert_eq!(result.distress_level, DistressLevel::Medium);
    assert_eq!(result.evidence_spans.len(), 1);
    assert_eq!(result.recommendations.len(), 3);
    assert!(!result.safety_flag);
    assert!(!result.has_qc_notes());
    assert_eq!(result.percent(), 62);
}

#[test]
fn missing_field_is_a_parse_error() {
    let mut value: serde_json::Value = serde_json::from_str(PAYLOAD).unwrap();
    value.as_object_mut().unwrap().remove("qc_notes");
    let err = serde_json::from_value::<AnalysisResult>(value).unwrap_err();
    assert!(err.to_string().contains("qc_notes"));
}

#[test]
fn unknown_level_is_rejected() {
    let bad = PAYLOAD.replace("\"medium\"", "\"severe\"");
    assert!(AnalysisResult::from_json_str(&bad).is_err());
}

#[test]
fn serializes_with_wire_names() {
    let result = AnalysisResult::from_json_str(PAYLOAD).unwrap();
    let value = serde_json::to_value(&result).unwrap();
    for field in REQUIRED_FIELDS {
        assert!(value.get(field).is_some(), "missing {field}");
    }
    assert_eq!(value["distress_level"], "medium");
}

#[test]
fn schema_requires_every_result_field() {
    let schema = response_schema();
    let required: Vec<&str> = schema["required"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(required, REQUIRED_FIELDS);

    let levels: Vec<&str> = schema["properties"]["distress_level"]["enum"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    let expected: Vec<&str> = DistressLevel::ALL.iter().map(|l| l.as_str()).collect();
    assert_eq!(levels, expected);
}

#[test]
fn level_bands_follow_the_rubric() {
    assert!(DistressLevel::None.accepts_score(0.0));
    assert!(DistressLevel::None.accepts_score(0.15));
    assert!(!DistressLevel::None.accepts_score(0.3));
    assert!(DistressLevel::Low.accepts_score(0.16));
    assert!(DistressLevel::Low.accepts_score(0.40));
    assert!(DistressLevel::Medium.accepts_score(0.75));
    assert!(!DistressLevel::Medium.accepts_score(0.9));
    assert!(DistressLevel::High.accepts_score(1.0));
    assert!(!DistressLevel::High.accepts_score(1.2));
    assert_eq!(DistressLevel::High.clamp_score(0.5), 0.76);
    assert_eq!(DistressLevel::None.clamp_score(0.5), 0.15);
}
