use common::{ConversationId, InteractionId, InteractionStub};
use serde::{Deserialize, Serialize};

/// The interaction field a request acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Context,
    Query,
    Answer,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Context => "context",
            Field::Query => "query",
            Field::Answer => "answer",
        }
    }
}

/// Request shape carried in an interaction message payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRequest {
    pub workflow_id: String,
    pub session_id: String,
    pub conversation_id: ConversationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<InteractionId>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub actor: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action: String,
    #[serde(rename = "type")]
    pub field: Field,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub version: i64,
}

/// Request shape carried in a conversation message payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    pub workflow_id: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    /// For `create`: optional initial interaction (its query seeds the first
    /// stub). For `update`: the stub to merge into the conversation's list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionStub>,
}
