//! Shared Bedrock runtime client.
//!
//! One [`BedrockClient`] is built at process start and shared (behind an
//! `Arc`) by the analysis, chat and extraction services. Building it never
//! touches credentials; they are resolved on the first request, so a
//! missing credential surfaces as [`BedrockError::Config`] on first use
//! rather than at startup.

use std::sync::OnceLock;

use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, Message, SystemContentBlock, ToolConfiguration,
};
use tracing::{debug, info};
use uuid::Uuid;

use distress_core::models::chat_context::{ChatRole, ChatTurn};

use crate::error::{BedrockError, format_err_chain};
use crate::tokens::{self, TokenUsage};

/// A single Converse request.
pub(crate) struct ConverseRequest<'a> {
    /// Short label for logs, e.g. `"analysis"`.
    pub purpose: &'static str,
    pub system_prompt: &'a str,
    pub messages: Vec<Message>,
    pub tool_config: Option<ToolConfiguration>,
}

/// Content blocks of a Converse response.
pub(crate) struct ConverseReply {
    pub content: Vec<ContentBlock>,
}

impl ConverseReply {
    /// Concatenated text blocks of the reply.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| {
                if let ContentBlock::Text(text) = block {
                    Some(text.as_str())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

pub struct BedrockClient {
    runtime: aws_sdk_bedrockruntime::Client,
    sdk_config: aws_config::SdkConfig,
    model_id: String,
    credentials_ok: OnceLock<()>,
}

impl BedrockClient {
    pub fn new(sdk_config: &aws_config::SdkConfig, model_id: impl Into<String>) -> Self {
        Self {
            runtime: aws_sdk_bedrockruntime::Client::new(sdk_config),
            sdk_config: sdk_config.clone(),
            model_id: model_id.into(),
            credentials_ok: OnceLock::new(),
        }
    }

    /// Load the AWS SDK config for `region` (and optional named profile)
    /// from the default provider chain.
    pub async fn load(region: &str, profile: Option<&str>, model_id: impl Into<String>) -> Self {
        let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()));
        if let Some(profile_name) = profile {
            builder = builder.profile_name(profile_name);
        }
        let sdk_config = builder.load().await;
        Self::new(&sdk_config, model_id)
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Resolve credentials once. Failures are reported on every call until a
    /// resolution succeeds.
    async fn ensure_credentials(&self) -> Result<(), BedrockError> {
        if self.credentials_ok.get().is_some() {
            return Ok(());
        }
        let provider = self.sdk_config.credentials_provider().ok_or_else(|| {
            BedrockError::Config("no AWS credentials provider is configured".to_string())
        })?;
        provider.provide_credentials().await.map_err(|e| {
            BedrockError::Config(format!(
                "AWS credentials are not available: {}",
                format_err_chain(&e)
            ))
        })?;
        let _ = self.credentials_ok.set(());
        Ok(())
    }

    /// Issue one Converse call. No retries.
    pub(crate) async fn converse(
        &self,
        request: ConverseRequest<'_>,
    ) -> Result<ConverseReply, BedrockError> {
        self.ensure_credentials().await?;

        let transaction_id = Uuid::new_v4();
        info!(
            transaction_id = %transaction_id,
            model = %self.model_id,
            purpose = request.purpose,
            messages = request.messages.len(),
            "starting converse request"
        );

        let response = self
            .runtime
            .converse()
            .model_id(&self.model_id)
            .system(SystemContentBlock::Text(request.system_prompt.to_string()))
            .set_messages(Some(request.messages))
            .set_tool_config(request.tool_config)
            .send()
            .await
            .map_err(|e| BedrockError::Invocation(format_err_chain(&e)))?;

        debug!(
            transaction_id = %transaction_id,
            stop_reason = ?response.stop_reason(),
            "converse response received"
        );

        let usage: TokenUsage = response
            .usage()
            .map(|u| tokens::usage_for(&self.model_id, tokens::extract_token_usage(u)))
            .unwrap_or_default();

        let output_message = response
            .output()
            .and_then(|o| o.as_message().ok())
            .ok_or_else(|| BedrockError::ResponseParse("no message in response".to_string()))?;

        info!(
            transaction_id = %transaction_id,
            purpose = request.purpose,
            input_tokens = usage.tokens.input,
            output_tokens = usage.tokens.output,
            total_tokens = usage.tokens.total(),
            cost_usd = usage.cost_usd,
            "converse request complete"
        );

        Ok(ConverseReply {
            content: output_message.content().to_vec(),
        })
    }
}

/// Build a Converse message holding a single text block.
pub(crate) fn text_message(role: ConversationRole, text: &str) -> Result<Message, BedrockError> {
    Message::builder()
        .role(role)
        .content(ContentBlock::Text(text.to_string()))
        .build()
        .map_err(|e| BedrockError::Request(e.to_string()))
}

/// Map a chat turn onto a Converse message.
pub(crate) fn turn_message(turn: &ChatTurn) -> Result<Message, BedrockError> {
    let role = match turn.role {
        ChatRole::User => ConversationRole::User,
        ChatRole::Assistant => ConversationRole::Assistant,
    };
    text_message(role, &turn.content)
}
