use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use distress_core::models::analysis::AnalysisResult;
use distress_core::models::chat_context::ChatContext;
use distress_core::models::message::Message;

use crate::error::SessionError;

/// A saved conversation: the visible log plus, once analyzed, everything
/// needed to continue the chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: Uuid,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalyzedState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedState {
    pub transcript: String,
    pub result: AnalysisResult,
    pub context: ChatContext,
}

impl ConversationRecord {
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the record as pretty JSON via a temp file and rename.
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(self)?;

        let mut tmp_path = path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        std::fs::write(&tmp_path, json.as_bytes())?;

        // Transcripts are clinical data.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&tmp_path, path)?;
        tracing::info!(path = %path.display(), conversation_id = %self.id, "conversation saved");
        Ok(())
    }
}
