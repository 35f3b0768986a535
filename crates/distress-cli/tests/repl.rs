use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use distress_cli::report::ExportFormat;
use distress_cli::repl::{Command, Input, Repl, parse_line, read_transcript};
use distress_core::error::ModelError;
use distress_core::models::analysis::{AnalysisResult, DistressLevel, EvidenceSpan};
use distress_core::models::chat_context::ChatContext;
use distress_core::models::message::Sender;
use distress_core::service::{BoxFuture, ChatService, DocumentImporter, StructuredGenerator};
use distress_session::Orchestrator;

fn worried() -> AnalysisResult {
    AnalysisResult {
        distress_level: DistressLevel::Low,
        score: 0.3,
        explanation_high_level: "Mild worry about the plan.".to_string(),
        evidence_spans: vec![EvidenceSpan {
            text: "I'm a bit worried".to_string(),
            reason: "Mild concern.".to_string(),
        }],
        recommendations: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        safety_flag: false,
        qc_notes: String::new(),
    }
}

#[derive(Default)]
struct Generator {
    transcripts: Mutex<Vec<String>>,
    fail_first: bool,
}

impl Generator {
    fn calls(&self) -> usize {
        self.transcripts.lock().unwrap().len()
    }
}

impl StructuredGenerator for Generator {
    fn analyze<'a>(
        &'a self,
        transcript: &'a str,
    ) -> BoxFuture<'a, Result<AnalysisResult, ModelError>> {
        let mut seen = self.transcripts.lock().unwrap();
        seen.push(transcript.to_string());
        let result = if self.fail_first && seen.len() == 1 {
            Err(ModelError::Transport("timed out".to_string()))
        } else {
            Ok(worried())
        };
        Box::pin(async move { result })
    }
}

#[derive(Default)]
struct EchoChat {
    calls: AtomicUsize,
    fail_first: bool,
}

impl ChatService for EchoChat {
    fn send<'a>(
        &'a self,
        context: &'a mut ChatContext,
        message: &'a str,
    ) -> BoxFuture<'a, Result<String, ModelError>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail_first && call == 0;
        Box::pin(async move {
            if fail {
                return Err(ModelError::Transport("throttled".to_string()));
            }
            let reply = format!("echo: {message}");
            context.record_exchange(message, &reply);
            Ok(reply)
        })
    }
}

#[derive(Default)]
struct Importer {
    calls: AtomicUsize,
}

impl DocumentImporter for Importer {
    fn extract_text<'a>(
        &'a self,
        _filename: &'a str,
        _bytes: &'a [u8],
    ) -> BoxFuture<'a, Result<String, ModelError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok("Patient: I'm a bit worried.".to_string()) })
    }
}

type TestRepl = Repl<Arc<Generator>, EchoChat, Importer>;

async fn run(generator: Generator, script: &str) -> (String, TestRepl, Arc<Generator>) {
    run_with(generator, EchoChat::default(), script).await
}

async fn run_with(
    generator: Generator,
    chat: EchoChat,
    script: &str,
) -> (String, TestRepl, Arc<Generator>) {
    let generator = Arc::new(generator);
    let mut repl = Repl::new(
        Orchestrator::new(Arc::clone(&generator), chat),
        Importer::default(),
    );
    let mut out = Vec::new();
    repl.run(tokio::io::BufReader::new(script.as_bytes()), &mut out)
        .await
        .unwrap();
    (String::from_utf8(out).unwrap(), repl, generator)
}

#[test]
fn parses_commands_and_text() {
    assert_eq!(parse_line("   ").unwrap(), Input::Blank);
    assert_eq!(
        parse_line("Patient: hello  ").unwrap(),
        Input::Text("Patient: hello".to_string())
    );
    assert_eq!(parse_line("/send").unwrap(), Input::Command(Command::Send));
    assert_eq!(parse_line("/retry").unwrap(), Input::Command(Command::Retry));
    assert_eq!(
        parse_line("/export pdf out/report.pdf").unwrap(),
        Input::Command(Command::Export {
            format: ExportFormat::Pdf,
            path: PathBuf::from("out/report.pdf"),
        })
    );
    assert_eq!(
        parse_line("/import notes.docx").unwrap(),
        Input::Command(Command::Import(PathBuf::from("notes.docx")))
    );
    assert!(parse_line("/export pdf").is_err());
    assert!(parse_line("/export gif x.gif").is_err());
    assert!(parse_line("/save").is_err());
    assert!(parse_line("/frobnicate").unwrap_err().contains("unknown command"));
}

#[tokio::test]
async fn multi_line_transcript_is_one_analysis_then_chat() {
    let script = "Doctor: How are you?\nPatient: I'm a bit worried.\n\nWhy low?\n\n/quit\n";
    let (out, repl, _) = run(Generator::default(), script).await;

    let orch = repl.orchestrator();
    assert!(orch.is_analyzed());
    assert_eq!(
        orch.transcript(),
        Some("Doctor: How are you?\nPatient: I'm a bit worried.")
    );
    assert!(out.contains("bot> Analysis complete."));
    assert!(out.contains("## Analysis Summary"));
    assert!(out.contains("bot> echo: Why low?"));
}

fn failing_generator() -> Generator {
    Generator {
        fail_first: true,
        ..Generator::default()
    }
}

#[tokio::test]
async fn failed_analysis_is_not_resent_at_end_of_input() {
    let (out, repl, generator) = run(failing_generator(), "transcript text\n\n").await;

    assert!(out.contains("bot> Error: "));
    assert!(out.contains("timed out"));
    assert!(!repl.orchestrator().is_analyzed());
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn retry_resends_the_failed_analysis() {
    let script = "transcript text\n\n/retry\n/retry\n";
    let (out, repl, generator) = run(failing_generator(), script).await;

    assert!(out.contains("Type /retry to send it again."));
    assert!(out.contains("Nothing to retry."));
    assert!(repl.orchestrator().is_analyzed());
    assert_eq!(repl.orchestrator().transcript(), Some("transcript text"));
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn failed_question_is_not_merged_into_the_next() {
    let chat = EchoChat {
        fail_first: true,
        ..EchoChat::default()
    };
    let (out, repl, _) = run_with(Generator::default(), chat, "transcript\n\nQ1\n\nQ2\n\n").await;

    assert!(out.contains("throttled"));
    assert!(out.contains("bot> echo: Q2"));
    let users: Vec<&str> = repl
        .orchestrator()
        .messages()
        .iter()
        .filter(|m| m.sender == Sender::User)
        .map(|m| m.text.as_str())
        .collect();
    assert_eq!(users, ["transcript", "Q1", "Q2"]);
    assert_eq!(repl.orchestrator().chat_context().unwrap().exchanges(), 1);
}

#[tokio::test]
async fn pending_input_is_dropped_at_end_of_input() {
    let (out, repl, generator) = run(Generator::default(), "typed but never sent\n").await;
    assert!(out.contains("Unsent input discarded."));
    assert!(!repl.orchestrator().is_analyzed());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn export_requires_an_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("r.pdf");
    let script = format!("/export pdf {}\n", path.display());
    let (out, _, _) = run(Generator::default(), &script).await;
    assert!(out.contains("Nothing to export yet"));
    assert!(!path.exists());
}

#[tokio::test]
async fn export_and_save_after_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("r.pdf");
    let md = dir.path().join("r.md");
    let saved = dir.path().join("conversation.json");
    let script = format!(
        "hello\n\n/export pdf {}\n/export md {}\n/save {}\n",
        pdf.display(),
        md.display(),
        saved.display()
    );
    let (out, _, _) = run(Generator::default(), &script).await;

    assert!(out.contains("Saved pdf report"));
    assert!(std::fs::read(&pdf).unwrap().starts_with(b"%PDF"));
    assert!(std::fs::read_to_string(&md).unwrap().contains("Score: 30 / 100"));
    let record = distress_session::ConversationRecord::load(&saved).unwrap();
    assert!(record.analysis.is_some());
}

#[tokio::test]
async fn wrong_import_type_leaves_input_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("scan.pdf");
    std::fs::write(&pdf, b"%PDF-1.4").unwrap();

    let mut repl = Repl::new(
        Orchestrator::new(Generator::default(), EchoChat::default()),
        Importer::default(),
    );
    let script = format!("draft\n/import {}\n/quit\n", pdf.display());
    let mut out = Vec::new();
    repl.run(tokio::io::BufReader::new(script.as_bytes()), &mut out)
        .await
        .unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Import failed: unsupported file type"));
    assert_eq!(repl.composer_mut().text(), "draft");
    assert!(!repl.orchestrator().is_analyzed());
}

#[tokio::test]
async fn docx_transcript_goes_through_importer() {
    let dir = tempfile::tempdir().unwrap();
    let docx = dir.path().join("visit.docx");
    std::fs::write(&docx, b"PK\x03\x04rest").unwrap();
    let importer = Importer::default();

    let text = read_transcript(&importer, &docx).await.unwrap();
    assert_eq!(text, "Patient: I'm a bit worried.");
    assert_eq!(importer.calls.load(Ordering::SeqCst), 1);

    let txt = dir.path().join("visit.txt");
    std::fs::write(&txt, "plain transcript").unwrap();
    assert_eq!(read_transcript(&importer, &txt).await.unwrap(), "plain transcript");
    assert_eq!(importer.calls.load(Ordering::SeqCst), 1);
}
