use aws_sdk_bedrockruntime::types::{ContentBlock, Tool, ToolChoice, ToolInputSchema, ToolUseBlock};
use serde_json::json;

use distress_bedrock::analysis::{analysis_tool_config, parse_analysis};
use distress_bedrock::document::json_to_document;
use distress_bedrock::error::BedrockError;
use distress_core::error::ModelError;
use distress_core::models::analysis::DistressLevel;
use distress_core::prompt::{ANALYSIS_TOOL_NAME, response_schema};

fn payload() -> serde_json::Value {
    json!({
        "distress_level": "high",
        "score": 0.92,
        "explanation_high_level": "The patient expresses hopelessness.",
        "evidence_spans": [
            { "text": "I don't want to live anymore", "reason": "Statement of suicidal ideation." }
        ],
        "recommendations": ["Follow the safety protocol.", "Stay with the patient.", "Offer crisis resources."],
        "safety_flag": true,
        "qc_notes": ""
    })
}

fn tool_use(name: &str, input: &serde_json::Value) -> ContentBlock {
    ContentBlock::ToolUse(
        ToolUseBlock::builder()
            .tool_use_id("tooluse_1")
            .name(name)
            .input(json_to_document(input))
            .build()
            .unwrap(),
    )
}

#[test]
fn tool_config_forces_the_analysis_tool() {
    let config = analysis_tool_config().unwrap();

    match config.tool_choice() {
        Some(ToolChoice::Tool(choice)) => assert_eq!(choice.name(), ANALYSIS_TOOL_NAME),
        other => panic!("expected a specific tool choice, got {other:?}"),
    }

    let tools = config.tools();
    assert_eq!(tools.len(), 1);
    let Tool::ToolSpec(spec) = &tools[0] else {
        panic!("expected a tool spec");
    };
    assert_eq!(spec.name(), ANALYSIS_TOOL_NAME);
    assert_eq!(
        spec.input_schema(),
        Some(&ToolInputSchema::Json(json_to_document(&response_schema())))
    );
}

#[test]
fn parses_tool_use_input() {
    let content = vec![
        ContentBlock::Text("Recording the analysis.".to_string()),
        tool_use(ANALYSIS_TOOL_NAME, &payload()),
    ];
    let analysis = parse_analysis(&content).unwrap();
    assert_eq!(analysis.distress_level, DistressLevel::High);
    assert!(analysis.safety_flag);
    assert_eq!(analysis.evidence_spans[0].text, "I don't want to live anymore");
}

#[test]
fn accepts_plain_json_text() {
    let content = vec![ContentBlock::Text(format!("  {}\n", payload()))];
    let analysis = parse_analysis(&content).unwrap();
    assert_eq!(analysis.score, 0.92);
}

#[test]
fn malformed_tool_input_is_a_parse_error() {
    let mut bad = payload();
    bad["score"] = json!("very high");
    let err = parse_analysis(&[tool_use(ANALYSIS_TOOL_NAME, &bad)]).unwrap_err();
    assert!(matches!(err, BedrockError::SchemaViolation(_)));
    assert!(matches!(ModelError::from(err), ModelError::Parse(_)));
}

#[test]
fn prose_answer_is_a_parse_error() {
    let content = vec![ContentBlock::Text("The patient seems fine.".to_string())];
    let err = parse_analysis(&content).unwrap_err();
    assert!(matches!(ModelError::from(err), ModelError::Parse(_)));
}

#[test]
fn other_tools_are_ignored() {
    let err = parse_analysis(&[tool_use("something_else", &payload())]).unwrap_err();
    assert!(matches!(err, BedrockError::ResponseParse(_)));
}
