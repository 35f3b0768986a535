//! Seams between the conversation logic and the external model service.
//!
//! Implementations are constructed once at process start and passed to the
//! orchestrator. Tests substitute in-memory fakes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::ModelError;
use crate::models::analysis::AnalysisResult;
use crate::models::chat_context::ChatContext;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Produces a schema-constrained analysis of a transcript.
///
/// Methods return boxed futures for dyn compatibility.
pub trait StructuredGenerator: Send + Sync {
    /// Issue exactly one analysis request. Implementations must not retry.
    fn analyze<'a>(
        &'a self,
        transcript: &'a str,
    ) -> BoxFuture<'a, Result<AnalysisResult, ModelError>>;
}

/// Answers follow-up questions about an analysis.
pub trait ChatService: Send + Sync {
    /// Open a context seeded with the transcript and its analysis.
    fn create_context(
        &self,
        transcript: &str,
        analysis: &AnalysisResult,
    ) -> Result<ChatContext, ModelError> {
        ChatContext::seed(transcript, analysis)
    }

    /// Send `message` in `context` and return the model's plain-text reply.
    /// On success the exchange is appended to the context history.
    fn send<'a>(
        &'a self,
        context: &'a mut ChatContext,
        message: &'a str,
    ) -> BoxFuture<'a, Result<String, ModelError>>;
}

/// Extracts plain text from an already-validated uploaded document.
pub trait DocumentImporter: Send + Sync {
    fn extract_text<'a>(
        &'a self,
        filename: &'a str,
        bytes: &'a [u8],
    ) -> BoxFuture<'a, Result<String, ModelError>>;
}

impl<T: StructuredGenerator + ?Sized> StructuredGenerator for Box<T> {
    fn analyze<'a>(
        &'a self,
        transcript: &'a str,
    ) -> BoxFuture<'a, Result<AnalysisResult, ModelError>> {
        (**self).analyze(transcript)
    }
}

impl<T: ChatService + ?Sized> ChatService for Box<T> {
    fn create_context(
        &self,
        transcript: &str,
        analysis: &AnalysisResult,
    ) -> Result<ChatContext, ModelError> {
        (**self).create_context(transcript, analysis)
    }

    fn send<'a>(
        &'a self,
        context: &'a mut ChatContext,
        message: &'a str,
    ) -> BoxFuture<'a, Result<String, ModelError>> {
        (**self).send(context, message)
    }
}

impl<T: StructuredGenerator + ?Sized> StructuredGenerator for Arc<T> {
    fn analyze<'a>(
        &'a self,
        transcript: &'a str,
    ) -> BoxFuture<'a, Result<AnalysisResult, ModelError>> {
        (**self).analyze(transcript)
    }
}

impl<T: ChatService + ?Sized> ChatService for Arc<T> {
    fn create_context(
        &self,
        transcript: &str,
        analysis: &AnalysisResult,
    ) -> Result<ChatContext, ModelError> {
        (**self).create_context(transcript, analysis)
    }

    fn send<'a>(
        &'a self,
        context: &'a mut ChatContext,
        message: &'a str,
    ) -> BoxFuture<'a, Result<String, ModelError>> {
        (**self).send(context, message)
    }
}

impl<T: DocumentImporter + ?Sized> DocumentImporter for Arc<T> {
    fn extract_text<'a>(
        &'a self,
        filename: &'a str,
        bytes: &'a [u8],
    ) -> BoxFuture<'a, Result<String, ModelError>> {
        (**self).extract_text(filename, bytes)
    }
}
