use std::collections::HashMap;

use common::{ConversationId, InteractionId};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{MessagingError, Result};

/// The aggregate a message acts on.
///
/// Unknown tags survive decoding as [`MessageType::Other`] so the router can
/// reject them with an explicit error instead of failing the whole envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    Conversation,
    Interaction,
    Other(String),
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Conversation => "conversation",
            MessageType::Interaction => "interaction",
            MessageType::Other(s) => s,
        }
    }

    /// True for the placeholder value carried by an empty message.
    pub fn is_unspecified(&self) -> bool {
        matches!(self, MessageType::Other(s) if s.is_empty())
    }
}

impl Default for MessageType {
    fn default() -> Self {
        MessageType::Other(String::new())
    }
}

impl From<String> for MessageType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "conversation" => MessageType::Conversation,
            "interaction" => MessageType::Interaction,
            _ => MessageType::Other(s),
        }
    }
}

impl From<MessageType> for String {
    fn from(t: MessageType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The operation performed on the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Get,
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Get => "get",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        };
        write!(f, "{s}")
    }
}

/// Domain-level payload inside an [`crate::Envelope`].
///
/// The `data` bytes are only meaningful in the context of (`type`, `action`);
/// an empty payload is valid for `get` and `delete`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<InteractionId>,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "MessageType::is_unspecified"
    )]
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

impl Message {
    /// Decodes the payload into the action-specific request shape.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.data {
            Some(value) => Ok(serde_json::from_value(value.clone())?),
            None => Err(MessagingError::EmptyPayload {
                message_id: self.id.clone(),
            }),
        }
    }

    /// Derives a response message from this one.
    ///
    /// The new message carries a fresh id but copies the workflow, session,
    /// conversation and interaction identifiers as well as the metadata map,
    /// so a consumer of the response can correlate it back to its scope.
    pub fn derive_response<T: Serialize>(
        &self,
        message_type: MessageType,
        action: Option<Action>,
        data: &T,
    ) -> Result<Message> {
        let raw = serde_json::to_value(data)?;
        Ok(Message {
            id: Uuid::new_v4().to_string(),
            version: 1,
            workflow_id: self.workflow_id.clone(),
            session_id: self.session_id.clone(),
            conversation_id: self.conversation_id,
            interaction_id: self.interaction_id,
            message_type,
            action,
            data: Some(raw),
            metadata: self.metadata.clone(),
        })
    }
}

/// Wire shape of a business error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    pub code: u16,
    pub message: String,
    pub skip_retry: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_round_trips_unknown_tags() {
        let t: MessageType = "workflow".to_string().into();
        assert_eq!(t, MessageType::Other("workflow".to_string()));
        assert_eq!(String::from(t), "workflow");
    }

    #[test]
    fn action_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Action::Create).unwrap(), "\"create\"");
        let a: Action = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(a, Action::Delete);
    }

    #[test]
    fn decode_data_fails_on_empty_payload() {
        let msg = Message {
            id: "m-1".to_string(),
            ..Default::default()
        };
        let result: Result<ErrorData> = msg.decode_data();
        assert!(matches!(result, Err(MessagingError::EmptyPayload { .. })));
    }

    #[test]
    fn derive_response_copies_scope_and_assigns_fresh_id() {
        let conversation_id = ConversationId::new();
        let msg = Message {
            id: "m-1".to_string(),
            workflow_id: Some("wf-1".to_string()),
            session_id: Some("s-1".to_string()),
            conversation_id: Some(conversation_id),
            message_type: MessageType::Conversation,
            action: Some(Action::Get),
            metadata: HashMap::from([("k".to_string(), serde_json::json!("v"))]),
            ..Default::default()
        };

        let response = msg
            .derive_response(
                MessageType::Conversation,
                Some(Action::Get),
                &serde_json::json!({"ok": true}),
            )
            .unwrap();

        assert_ne!(response.id, msg.id);
        assert_eq!(response.workflow_id, msg.workflow_id);
        assert_eq!(response.session_id, msg.session_id);
        assert_eq!(response.conversation_id, Some(conversation_id));
        assert_eq!(response.metadata, msg.metadata);
        assert_eq!(response.data, Some(serde_json::json!({"ok": true})));
    }
}
