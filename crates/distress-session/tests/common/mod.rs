#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use distress_core::error::ModelError;
use distress_core::models::analysis::{AnalysisResult, DistressLevel, EvidenceSpan};
use distress_core::models::chat_context::ChatContext;
use distress_core::service::{BoxFuture, ChatService, DocumentImporter, StructuredGenerator};

pub fn calm_analysis() -> AnalysisResult {
    AnalysisResult {
        distress_level: DistressLevel::None,
        score: 0.05,
        explanation_high_level: "The patient is focused on practical next steps.".to_string(),
        evidence_spans: vec![],
        recommendations: vec![
            "Share a written plan.".to_string(),
            "Schedule the dietitian visit.".to_string(),
            "Invite further questions.".to_string(),
        ],
        safety_flag: false,
        qc_notes: String::new(),
    }
}

pub fn crisis_analysis() -> AnalysisResult {
    AnalysisResult {
        distress_level: DistressLevel::High,
        score: 0.95,
        explanation_high_level: "The patient expresses hopelessness.".to_string(),
        evidence_spans: vec![EvidenceSpan {
            text: "I don't want to live anymore".to_string(),
            reason: "Statement of suicidal ideation.".to_string(),
        }],
        recommendations: vec![
            "Follow the crisis protocol.".to_string(),
            "Do not leave the patient alone.".to_string(),
            "Provide crisis line information.".to_string(),
        ],
        safety_flag: true,
        qc_notes: String::new(),
    }
}

/// Returns queued answers in order and counts calls.
#[derive(Default)]
pub struct ScriptedGenerator {
    answers: Mutex<VecDeque<Result<AnalysisResult, ModelError>>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(answers: Vec<Result<AnalysisResult, ModelError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StructuredGenerator for ScriptedGenerator {
    fn analyze<'a>(
        &'a self,
        _transcript: &'a str,
    ) -> BoxFuture<'a, Result<AnalysisResult, ModelError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Transport("no scripted answer".to_string())));
        Box::pin(async move { answer })
    }
}

/// Chat fake: replies are queued, each with a delay to simulate latency.
#[derive(Default)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<(Duration, Result<String, ModelError>)>>,
    calls: AtomicUsize,
}

impl ScriptedChat {
    pub fn new(replies: Vec<Result<String, ModelError>>) -> Self {
        Self::with_delays(replies.into_iter().map(|r| (Duration::ZERO, r)).collect())
    }

    pub fn with_delays(replies: Vec<(Duration, Result<String, ModelError>)>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChatService for ScriptedChat {
    fn send<'a>(
        &'a self,
        context: &'a mut ChatContext,
        message: &'a str,
    ) -> BoxFuture<'a, Result<String, ModelError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, reply) = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                (
                    Duration::ZERO,
                    Err(ModelError::Transport("no scripted reply".to_string())),
                )
            });
        Box::pin(async move {
            context.ensure_ready()?;
            tokio::time::sleep(delay).await;
            let reply = reply?;
            context.record_exchange(message, &reply);
            Ok(reply)
        })
    }
}

/// Importer that must never be reached for rejected files.
#[derive(Default)]
pub struct CountingImporter {
    pub text: String,
    calls: AtomicUsize,
}

impl CountingImporter {
    pub fn returning(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DocumentImporter for CountingImporter {
    fn extract_text<'a>(
        &'a self,
        _filename: &'a str,
        _bytes: &'a [u8],
    ) -> BoxFuture<'a, Result<String, ModelError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = self.text.clone();
        Box::pin(async move { Ok(text) })
    }
}
