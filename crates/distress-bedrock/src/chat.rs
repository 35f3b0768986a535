//! Follow-up conversation about a finished analysis.
//!
//! Bedrock has no server-side session, so the [`ChatContext`] carries the
//! whole history and every turn resends it: the seeded transcript and
//! analysis turns, all earlier exchanges, then the new question.

use tracing::info;

use distress_core::error::ModelError;
use distress_core::models::chat_context::ChatContext;
use distress_core::service::{BoxFuture, ChatService};

use crate::client::{BedrockClient, ConverseRequest, turn_message};
use crate::error::BedrockError;

impl BedrockClient {
    /// Send `message` in `context` and return the assistant's reply.
    ///
    /// The context is only extended once a reply has arrived.
    pub async fn chat_converse(
        &self,
        context: &mut ChatContext,
        message: &str,
    ) -> Result<String, BedrockError> {
        let messages = context
            .outgoing(message)
            .iter()
            .map(turn_message)
            .collect::<Result<Vec<_>, _>>()?;

        let reply = self
            .converse(ConverseRequest {
                purpose: "chat",
                system_prompt: context.system_prompt(),
                messages,
                tool_config: None,
            })
            .await?;

        let text = reply.text();
        if text.trim().is_empty() {
            return Err(BedrockError::ResponseParse(
                "chat response contained no text".to_string(),
            ));
        }

        context.record_exchange(message, &text);
        info!(exchanges = context.exchanges(), "chat reply received");
        Ok(text)
    }
}

impl ChatService for BedrockClient {
    fn send<'a>(
        &'a self,
        context: &'a mut ChatContext,
        message: &'a str,
    ) -> BoxFuture<'a, Result<String, ModelError>> {
        Box::pin(async move {
            context.ensure_ready()?;
            Ok(self.chat_converse(context, message).await?)
        })
    }
}
