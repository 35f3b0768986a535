//! Conversation orchestrator.
//!
//! A conversation has exactly two persisted phases. It starts in
//! [`Phase::PreAnalysis`] with a welcome message; the first submission that
//! produces an analysis moves it to [`Phase::PostAnalysis`], which holds the
//! analysis and the chat context seeded from it. There is no way back, so a
//! conversation carries at most one analysis.
//!
//! `submit` takes `&mut self`: while a request is in flight nothing else can
//! touch the conversation, which keeps the message log in submission order.

use jiff::Timestamp;
use tracing::{info, warn};
use uuid::Uuid;

use distress_core::models::analysis::AnalysisResult;
use distress_core::models::chat_context::ChatContext;
use distress_core::models::message::Message;
use distress_core::prompt;
use distress_core::service::{ChatService, StructuredGenerator};

use crate::error::SessionError;
use crate::record::{AnalyzedState, ConversationRecord};

/// Persisted state of a conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    PreAnalysis,
    PostAnalysis {
        transcript: String,
        analysis: AnalysisResult,
        context: ChatContext,
    },
}

/// What a successful submission did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// The input was analyzed; the result is available via
    /// [`Orchestrator::analysis`].
    Analyzed,
    /// The input was a follow-up question; this is the model's reply.
    Replied(String),
}

pub struct Orchestrator<G, C> {
    generator: G,
    chat: C,
    id: Uuid,
    created_at: Timestamp,
    updated_at: Timestamp,
    messages: Vec<Message>,
    phase: Phase,
}

impl<G, C> Orchestrator<G, C>
where
    G: StructuredGenerator,
    C: ChatService,
{
    /// Start a conversation with the welcome message.
    pub fn new(generator: G, chat: C) -> Self {
        let now = Timestamp::now();
        Self {
            generator,
            chat,
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            messages: vec![Message::bot(prompt::WELCOME_MESSAGE)],
            phase: Phase::PreAnalysis,
        }
    }

    /// Resume a saved conversation.
    pub fn resume(generator: G, chat: C, record: ConversationRecord) -> Result<Self, SessionError> {
        if record.messages.is_empty() {
            return Err(SessionError::InvalidRecord(
                "record has no messages".to_string(),
            ));
        }
        let phase = match record.analysis {
            None => Phase::PreAnalysis,
            Some(state) => {
                state.context.ensure_ready()?;
                Phase::PostAnalysis {
                    transcript: state.transcript,
                    analysis: state.result,
                    context: state.context,
                }
            }
        };
        info!(conversation_id = %record.id, messages = record.messages.len(), "conversation resumed");
        Ok(Self {
            generator,
            chat,
            id: record.id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            messages: record.messages,
            phase,
        })
    }

    /// Handle one user input.
    ///
    /// The user message is logged immediately. Exactly one bot message
    /// follows: the acknowledgment, the chat reply, or `"Error: ..."`. On
    /// error the phase is unchanged and the error is also returned, so a
    /// failed analysis is retried as analysis on the next submission.
    pub async fn submit(&mut self, input: &str) -> Result<Turn, SessionError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        self.push(Message::user(text));

        let outcome = match self.phase {
            Phase::PreAnalysis => self.start_analysis(text).await,
            Phase::PostAnalysis {
                ref mut context, ..
            } => self
                .chat
                .send(context, text)
                .await
                .map(Turn::Replied)
                .map_err(SessionError::from),
        };

        match outcome {
            Ok(turn) => {
                let reply = match &turn {
                    Turn::Analyzed => prompt::ANALYSIS_ACK_MESSAGE.to_string(),
                    Turn::Replied(text) => text.clone(),
                };
                self.push(Message::bot(reply));
                Ok(turn)
            }
            Err(e) => {
                warn!(conversation_id = %self.id, error = %e, "submission failed");
                self.push(Message::bot(format!("Error: {e}")));
                Err(e)
            }
        }
    }

    async fn start_analysis(&mut self, transcript: &str) -> Result<Turn, SessionError> {
        let analysis = self.generator.analyze(transcript).await?;
        let context = self.chat.create_context(transcript, &analysis)?;

        info!(
            conversation_id = %self.id,
            level = %analysis.distress_level,
            safety_flag = analysis.safety_flag,
            "conversation moved to post-analysis"
        );

        self.phase = Phase::PostAnalysis {
            transcript: transcript.to_string(),
            analysis,
            context,
        };
        Ok(Turn::Analyzed)
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Timestamp::now();
    }
}

impl<G, C> Orchestrator<G, C> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_analyzed(&self) -> bool {
        matches!(self.phase, Phase::PostAnalysis { .. })
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        match &self.phase {
            Phase::PostAnalysis { analysis, .. } => Some(analysis),
            Phase::PreAnalysis => None,
        }
    }

    pub fn transcript(&self) -> Option<&str> {
        match &self.phase {
            Phase::PostAnalysis { transcript, .. } => Some(transcript),
            Phase::PreAnalysis => None,
        }
    }

    pub fn chat_context(&self) -> Option<&ChatContext> {
        match &self.phase {
            Phase::PostAnalysis { context, .. } => Some(context),
            Phase::PreAnalysis => None,
        }
    }

    /// Snapshot of the conversation for saving.
    pub fn record(&self) -> ConversationRecord {
        let analysis = match &self.phase {
            Phase::PreAnalysis => None,
            Phase::PostAnalysis {
                transcript,
                analysis,
                context,
            } => Some(AnalyzedState {
                transcript: transcript.clone(),
                result: analysis.clone(),
                context: context.clone(),
            }),
        };
        ConversationRecord {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            messages: self.messages.clone(),
            analysis,
        }
    }
}
