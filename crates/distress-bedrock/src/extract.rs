//! Document text extraction via the Bedrock Converse API.
//!
//! Sends an uploaded DOCX to the model as a `DocumentBlock` and asks for the
//! plain text. The Converse API parses the container natively. Callers
//! validate the upload first (see `distress_core::import`).

use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, DocumentBlock, DocumentFormat, DocumentSource, Message,
};
use tracing::info;

use distress_core::error::ModelError;
use distress_core::service::{BoxFuture, DocumentImporter};

use crate::client::{BedrockClient, ConverseRequest};
use crate::error::BedrockError;

const EXTRACTION_SYSTEM_PROMPT: &str = "\
Extract the complete text content from this document. \
Return only the plain text, preserving paragraph structure and speaker labels. \
Do not add commentary, headers, or formatting.";

impl BedrockClient {
    /// Extract plain text from a DOCX document.
    pub async fn extract_document_text(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<String, BedrockError> {
        let doc_block = DocumentBlock::builder()
            .format(DocumentFormat::Docx)
            .name(sanitize_document_name(filename))
            .source(DocumentSource::Bytes(aws_smithy_types::Blob::new(bytes)))
            .build()
            .map_err(|e| BedrockError::Request(e.to_string()))?;

        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Document(doc_block))
            .content(ContentBlock::Text(
                "Extract the full text from this document.".to_string(),
            ))
            .build()
            .map_err(|e| BedrockError::Request(e.to_string()))?;

        info!(filename, size = bytes.len(), "extracting text from document");

        let reply = self
            .converse(ConverseRequest {
                purpose: "extract",
                system_prompt: EXTRACTION_SYSTEM_PROMPT,
                messages: vec![message],
                tool_config: None,
            })
            .await?;

        let text = reply.text();
        info!(filename, text_len = text.len(), "document text extraction complete");
        Ok(text)
    }
}

impl DocumentImporter for BedrockClient {
    fn extract_text<'a>(
        &'a self,
        filename: &'a str,
        bytes: &'a [u8],
    ) -> BoxFuture<'a, Result<String, ModelError>> {
        Box::pin(async move { Ok(self.extract_document_text(bytes, filename).await?) })
    }
}

/// Sanitize a filename for use as a Bedrock `DocumentBlock` name.
///
/// The name field only allows alphanumeric characters, single whitespace,
/// hyphens, parentheses, and square brackets. The extension is dropped.
pub fn sanitize_document_name(filename: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(filename);

    let mut result = String::with_capacity(stem.len());
    let mut prev_space = false;
    for c in stem.chars() {
        let keep = c.is_alphanumeric() || matches!(c, '-' | '(' | ')' | '[' | ']');
        if keep {
            result.push(c);
            prev_space = false;
        } else if !prev_space {
            result.push(' ');
            prev_space = true;
        }
    }

    let trimmed = result.trim();
    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed.to_string()
    }
}
