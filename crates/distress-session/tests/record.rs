mod common;

use std::sync::Arc;

use distress_session::{ConversationRecord, Orchestrator, Phase};

use common::{ScriptedChat, ScriptedGenerator, calm_analysis};

#[tokio::test]
async fn saved_conversation_resumes_in_post_analysis() {
    let generator = Arc::new(ScriptedGenerator::new(vec![Ok(calm_analysis())]));
    let chat = Arc::new(ScriptedChat::new(vec![
        Ok("first reply".to_string()),
        Ok("after resume".to_string()),
    ]));

    let mut orch = Orchestrator::new(Arc::clone(&generator), Arc::clone(&chat));
    orch.submit("Okay, what's next?").await.unwrap();
    orch.submit("Why?").await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    orch.record().save(&path).unwrap();

    let loaded = ConversationRecord::load(&path).unwrap();
    assert_eq!(loaded, orch.record());

    let mut resumed = Orchestrator::resume(Arc::clone(&generator), Arc::clone(&chat), loaded).unwrap();
    assert_eq!(resumed.id(), orch.id());
    assert!(matches!(resumed.phase(), Phase::PostAnalysis { .. }));

    resumed.submit("And now?").await.unwrap();
    assert_eq!(generator.calls(), 1);
    assert_eq!(resumed.chat_context().unwrap().exchanges(), 2);
}

#[test]
fn pre_analysis_record_omits_analysis() {
    let orch = Orchestrator::new(ScriptedGenerator::default(), ScriptedChat::default());
    let json = serde_json::to_value(orch.record()).unwrap();
    assert!(json.get("analysis").is_none());
    assert_eq!(json["messages"][0]["sender"], "bot");
}

#[test]
fn empty_record_is_refused() {
    let mut record = Orchestrator::new(ScriptedGenerator::default(), ScriptedChat::default()).record();
    record.messages.clear();
    assert!(Orchestrator::resume(ScriptedGenerator::default(), ScriptedChat::default(), record).is_err());
}
