use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ConversationId, HistoryId, InteractionId};
use crate::version::Version;

/// Projection of an interaction embedded in its parent conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionStub {
    pub id: InteractionId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub answer: String,
}

/// Conversation aggregate root.
///
/// Stub ids are unique within `interactions`; the list keeps insertion order
/// across updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub workflow_id: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    pub interactions: Vec<InteractionStub>,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Interaction aggregate, stored independently and referenced from its parent
/// conversation by stub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: InteractionId,
    pub workflow_id: String,
    pub session_id: String,
    pub conversation_id: ConversationId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub answer: String,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit record, one per accepted interaction mutation.
///
/// Captures the state *being changed* and the interaction's version before
/// the increment; replaying records with version ≤ n reconstructs the
/// interaction at version n. Existing records are never updated or compacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionHistory {
    pub id: HistoryId,
    pub workflow_id: String,
    pub session_id: String,
    pub conversation_id: ConversationId,
    pub interaction_id: InteractionId,
    pub action: String,
    pub actor: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub version: Version,
}

impl InteractionHistory {
    /// Snapshots an interaction's current state into a new history record.
    pub fn capture(interaction: &Interaction, actor: &str, action: &str) -> Self {
        Self {
            id: HistoryId::new(),
            workflow_id: interaction.workflow_id.clone(),
            session_id: interaction.session_id.clone(),
            conversation_id: interaction.conversation_id,
            interaction_id: interaction.id,
            action: action.to_string(),
            actor: actor.to_string(),
            context: interaction.context.clone(),
            query: interaction.query.clone(),
            answer: interaction.answer.clone(),
            created_at: Utc::now(),
            version: interaction.version,
        }
    }
}
