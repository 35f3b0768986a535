//! Integration tests against the real Bedrock runtime.
//!
//! These tests call real AWS APIs and require valid credentials in the
//! environment (e.g. `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`) and
//! access to the model in `DISTRESS_MODEL_ID` (or the default below).
//!
//! Run with: `cargo test -p distress-bedrock --test live -- --ignored`

use distress_bedrock::BedrockClient;
use distress_core::models::analysis::DistressLevel;
use distress_core::service::{ChatService, StructuredGenerator};
use distress_core::validate::validate;

const DEFAULT_MODEL: &str = "us.anthropic.claude-sonnet-4-5-20250929-v1:0";

async fn build_client() -> BedrockClient {
    let model = std::env::var("DISTRESS_MODEL_ID").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    BedrockClient::load("us-east-1", None, model).await
}

/// Logistics-only transcript is classified as no distress, inside its band.
#[tokio::test]
#[ignore]
async fn calm_transcript_is_none() {
    let client = build_client().await;
    let transcript = "Okay, what's next?";
    let analysis = client.analyze(transcript).await.expect("analysis should succeed");

    println!("{analysis:#?}");
    assert_eq!(analysis.distress_level, DistressLevel::None);
    assert!(analysis.distress_level.accepts_score(analysis.score));
}

/// Suicidal ideation raises the safety flag.
#[tokio::test]
#[ignore]
async fn crisis_statement_sets_safety_flag() {
    let client = build_client().await;
    let transcript = "Patient: Since the diagnosis I can't sleep. Honestly, I don't want to live anymore.";
    let analysis = client.analyze(transcript).await.expect("analysis should succeed");

    assert!(analysis.safety_flag);
    assert!(!analysis.evidence_spans.is_empty());
    let issues = validate(&analysis, transcript);
    println!("rubric issues: {issues:?}");
}

/// A seeded context answers a follow-up and grows by one exchange.
#[tokio::test]
#[ignore]
async fn follow_up_question_uses_seeded_context() {
    let client = build_client().await;
    let transcript = "Patient: I'm a bit worried about giving myself shots, but I guess I'll learn.";
    let analysis = client.analyze(transcript).await.expect("analysis should succeed");

    let mut context = client.create_context(transcript, &analysis).unwrap();
    let reply = client
        .send(&mut context, "Which quote mattered most?")
        .await
        .expect("chat should succeed");

    println!("{reply}");
    assert!(!reply.trim().is_empty());
    assert_eq!(context.exchanges(), 1);
}
