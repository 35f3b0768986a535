//! Structured transcript analysis via forced tool use.
//!
//! The Converse API has no JSON response mode, so the output schema is
//! offered as the input schema of a single tool and the model is required
//! to call it. The tool-use input is the analysis payload.

use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, SpecificToolChoice, Tool, ToolChoice, ToolConfiguration,
    ToolInputSchema, ToolSpecification,
};
use tracing::info;

use distress_core::error::ModelError;
use distress_core::models::analysis::AnalysisResult;
use distress_core::prompt;
use distress_core::service::{BoxFuture, StructuredGenerator};

use crate::client::{BedrockClient, ConverseRequest, text_message};
use crate::document::{document_to_json, json_to_document};
use crate::error::BedrockError;

/// Tool configuration carrying the analysis output schema.
pub fn analysis_tool_config() -> Result<ToolConfiguration, BedrockError> {
    let spec = ToolSpecification::builder()
        .name(prompt::ANALYSIS_TOOL_NAME)
        .description(prompt::ANALYSIS_TOOL_DESCRIPTION)
        .input_schema(ToolInputSchema::Json(json_to_document(
            &prompt::response_schema(),
        )))
        .build()
        .map_err(|e| BedrockError::Request(e.to_string()))?;

    let choice = SpecificToolChoice::builder()
        .name(prompt::ANALYSIS_TOOL_NAME)
        .build()
        .map_err(|e| BedrockError::Request(e.to_string()))?;

    ToolConfiguration::builder()
        .tools(Tool::ToolSpec(spec))
        .tool_choice(ToolChoice::Tool(choice))
        .build()
        .map_err(|e| BedrockError::Request(e.to_string()))
}

/// Pull the analysis out of the response content.
///
/// The tool-use block is preferred. A model that answers in plain text is
/// accepted only if that text is itself a JSON object of the right shape.
pub fn parse_analysis(content: &[ContentBlock]) -> Result<AnalysisResult, BedrockError> {
    let tool_input = content.iter().find_map(|block| match block {
        ContentBlock::ToolUse(tool_use) if tool_use.name() == prompt::ANALYSIS_TOOL_NAME => {
            Some(tool_use.input())
        }
        _ => None,
    });

    if let Some(input) = tool_input {
        let value = document_to_json(input);
        return serde_json::from_value(value).map_err(|e| {
            BedrockError::SchemaViolation(format!("failed to parse AnalysisResult: {e}"))
        });
    }

    let text = content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        return Err(BedrockError::ResponseParse(
            "response contained neither a tool call nor text".to_string(),
        ));
    }

    AnalysisResult::from_json_str(&text).map_err(|e| {
        BedrockError::SchemaViolation(format!(
            "failed to parse AnalysisResult: {e}. Response: {text}"
        ))
    })
}

impl BedrockClient {
    /// Send one transcript for analysis.
    pub async fn analyze_transcript(&self, transcript: &str) -> Result<AnalysisResult, BedrockError> {
        let request = ConverseRequest {
            purpose: "analysis",
            system_prompt: prompt::SYSTEM_PROMPT,
            messages: vec![text_message(ConversationRole::User, transcript)?],
            tool_config: Some(analysis_tool_config()?),
        };

        let reply = self.converse(request).await?;
        let analysis = parse_analysis(&reply.content)?;

        info!(
            level = %analysis.distress_level,
            score = analysis.score,
            safety_flag = analysis.safety_flag,
            evidence = analysis.evidence_spans.len(),
            "analysis complete"
        );

        Ok(analysis)
    }
}

impl StructuredGenerator for BedrockClient {
    fn analyze<'a>(
        &'a self,
        transcript: &'a str,
    ) -> BoxFuture<'a, Result<AnalysisResult, ModelError>> {
        Box::pin(async move { Ok(self.analyze_transcript(transcript).await?) })
    }
}
