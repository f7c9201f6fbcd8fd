use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::message::{Action, ErrorData, Message, MessageType};

/// Version of the envelope wire schema.
pub const SCHEMA_VERSION: &str = "1.0";

/// Messaging-level behavior of an envelope.
///
/// An `error` envelope is terminal: it never triggers a new domain mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Request,
    Response,
    Event,
    Command,
    Query,
    Error,
}

/// Authentication context propagated with an envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub issuer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scopes: String,
}

/// Principal on whose behalf an envelope is processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub organization: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tenant: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
}

/// Outer transport unit carrying routing, retry and trace metadata plus
/// exactly one [`Message`].
///
/// A `retryCount` at or past `maxRetries` marks the envelope as exhausted;
/// downstream consumers must not redeliver it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub id: String,
    pub schema_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub correlation_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub idempotency_key: String,
    pub kind: Kind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event_name: String,
    pub retry_count: u32,
    pub max_retries: u32,
    pub trace_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_info: Option<AuthInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub message: Message,
}

impl Envelope {
    /// Starts building an envelope around a message.
    ///
    /// Defaults: fresh correlation id, trace id and idempotency key,
    /// `kind = Request`, `retryCount = 0`, `maxRetries = 0`.
    pub fn builder(message: Message) -> EnvelopeBuilder {
        EnvelopeBuilder::new(message)
    }

    /// Returns a copy prepared for redelivery outside the broker's own retry:
    /// `retryCount + 1`, a fresh id and timestamp, everything else unchanged.
    pub fn with_retry(&self) -> Envelope {
        let mut env = self.clone();
        env.retry_count += 1;
        env.id = Uuid::new_v4().to_string();
        env.created_at = Utc::now();
        env
    }

    /// Builds a terminal `kind = Error` reply to this envelope.
    ///
    /// With `skip_retry` the retry count is forced to `maxRetries`, marking
    /// the message as exhausted; otherwise it is incremented by 1. The
    /// original message and correlation id are preserved so consumers can
    /// still scope the failure.
    pub fn error_reply(&self, event_name: impl Into<String>, skip_retry: bool) -> Envelope {
        let retry_count = if skip_retry {
            self.max_retries
        } else {
            self.retry_count + 1
        };
        Envelope::builder(self.message.clone())
            .kind(Kind::Error)
            .event_name(event_name)
            .correlation_id(&self.correlation_id)
            .trace_id(&self.trace_id)
            .max_retries(self.max_retries)
            .retry_count(retry_count)
            .build()
    }

    /// Builds a `kind = Response`, `eventName = "error"` reply whose payload
    /// is a structured [`ErrorData`] record.
    ///
    /// `public_message` is what goes on the wire; internal error detail must
    /// be logged by the caller, never passed here. This path is infallible:
    /// if the error payload itself cannot be built, the reply degrades to an
    /// empty-message `kind = Error`, `eventName = "fatal-error"` envelope.
    pub fn business_error(
        &self,
        code: u16,
        public_message: impl Into<String>,
        skip_retry: bool,
    ) -> Envelope {
        let error_data = ErrorData {
            code,
            message: public_message.into(),
            skip_retry,
        };
        match self.message.derive_response(
            self.message.message_type.clone(),
            self.message.action,
            &error_data,
        ) {
            Ok(message) => Envelope::builder(message)
                .kind(Kind::Response)
                .event_name("error")
                .correlation_id(&self.correlation_id)
                .idempotency_key(&self.idempotency_key)
                .trace_id(&self.trace_id)
                .max_retries(self.max_retries)
                .retry_count(self.retry_count + 1)
                .build(),
            Err(err) => {
                tracing::error!(error = %err, envelope_id = %self.id, "failed to build error payload");
                Envelope::builder(Message::default())
                    .kind(Kind::Error)
                    .event_name("fatal-error")
                    .correlation_id(&self.correlation_id)
                    .max_retries(self.max_retries)
                    .retry_count(self.retry_count + 1)
                    .build()
            }
        }
    }

    /// Derives a success response envelope carrying `data`, preserving the
    /// request's correlation id, trace id and idempotency key.
    pub fn success_reply<T: Serialize>(
        &self,
        message_type: MessageType,
        action: Option<Action>,
        data: &T,
    ) -> Result<Envelope> {
        let message = self.message.derive_response(message_type, action, data)?;
        Ok(Envelope::builder(message)
            .kind(Kind::Response)
            .event_name("success")
            .correlation_id(&self.correlation_id)
            .trace_id(&self.trace_id)
            .idempotency_key(&self.idempotency_key)
            .max_retries(self.max_retries)
            .build())
    }

    /// Serializes the envelope to its JSON wire form.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses an envelope from its JSON wire form.
    pub fn from_json(data: &[u8]) -> Result<Envelope> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Builder for [`Envelope`] values.
///
/// Every recognized option is independently settable; unset options keep the
/// defaults documented on [`Envelope::builder`].
#[derive(Debug)]
pub struct EnvelopeBuilder {
    envelope: Envelope,
}

impl EnvelopeBuilder {
    fn new(message: Message) -> Self {
        let id = if message.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            message.id.clone()
        };
        Self {
            envelope: Envelope {
                id,
                schema_version: SCHEMA_VERSION.to_string(),
                correlation_id: Uuid::new_v4().to_string(),
                idempotency_key: Uuid::new_v4().to_string(),
                kind: Kind::Request,
                event_name: String::new(),
                retry_count: 0,
                max_retries: 0,
                trace_id: Uuid::new_v4().to_string(),
                created_at: Utc::now(),
                auth_info: None,
                principal: None,
                message,
            },
        }
    }

    pub fn auth_info(mut self, auth: AuthInfo) -> Self {
        self.envelope.auth_info = Some(auth);
        self
    }

    pub fn principal(mut self, principal: Principal) -> Self {
        self.envelope.principal = Some(principal);
        self
    }

    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.envelope.correlation_id = id.into();
        self
    }

    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.envelope.idempotency_key = key.into();
        self
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.envelope.kind = kind;
        self
    }

    pub fn event_name(mut self, name: impl Into<String>) -> Self {
        self.envelope.event_name = name.into();
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.envelope.max_retries = n;
        self
    }

    pub fn retry_count(mut self, n: u32) -> Self {
        self.envelope.retry_count = n;
        self
    }

    pub fn trace_id(mut self, trace: impl Into<String>) -> Self {
        self.envelope.trace_id = trace.into();
        self
    }

    pub fn build(self) -> Envelope {
        self.envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_envelope() -> Envelope {
        let msg = Message {
            id: "m-1".to_string(),
            workflow_id: Some("wf-1".to_string()),
            session_id: Some("s-1".to_string()),
            message_type: MessageType::Interaction,
            action: Some(Action::Update),
            data: Some(serde_json::json!({"value": 42})),
            ..Default::default()
        };
        Envelope::builder(msg).max_retries(3).retry_count(1).build()
    }

    #[test]
    fn builder_defaults() {
        let env = Envelope::builder(Message::default()).build();
        assert_eq!(env.kind, Kind::Request);
        assert_eq!(env.schema_version, SCHEMA_VERSION);
        assert_eq!(env.retry_count, 0);
        assert!(!env.correlation_id.is_empty());
        assert!(!env.trace_id.is_empty());
        assert!(!env.idempotency_key.is_empty());
    }

    #[test]
    fn builder_options_override_defaults() {
        let env = Envelope::builder(Message::default())
            .kind(Kind::Command)
            .event_name("InteractionUpdated")
            .correlation_id("corr-1")
            .idempotency_key("idem-1")
            .trace_id("trace-1")
            .max_retries(5)
            .retry_count(2)
            .auth_info(AuthInfo {
                subject: "svc".to_string(),
                ..Default::default()
            })
            .build();

        assert_eq!(env.kind, Kind::Command);
        assert_eq!(env.event_name, "InteractionUpdated");
        assert_eq!(env.correlation_id, "corr-1");
        assert_eq!(env.idempotency_key, "idem-1");
        assert_eq!(env.trace_id, "trace-1");
        assert_eq!(env.max_retries, 5);
        assert_eq!(env.retry_count, 2);
        assert_eq!(env.auth_info.unwrap().subject, "svc");
    }

    #[test]
    fn with_retry_bumps_count_and_refreshes_identity() {
        let env = request_envelope();
        let retried = env.with_retry();
        assert_eq!(retried.retry_count, env.retry_count + 1);
        assert_ne!(retried.id, env.id);
        assert_eq!(retried.correlation_id, env.correlation_id);
        assert_eq!(retried.message, env.message);
    }

    #[test]
    fn error_reply_skip_retry_forces_max() {
        let env = request_envelope();
        let reply = env.error_reply("malformed-envelope", true);
        assert_eq!(reply.kind, Kind::Error);
        assert_eq!(reply.retry_count, env.max_retries);
        assert_eq!(reply.max_retries, env.max_retries);
        assert_eq!(reply.correlation_id, env.correlation_id);
    }

    #[test]
    fn error_reply_without_skip_increments() {
        let env = request_envelope();
        let reply = env.error_reply("handler-error", false);
        assert_eq!(reply.retry_count, env.retry_count + 1);
    }

    #[test]
    fn business_error_carries_structured_payload() {
        let env = request_envelope();
        let reply = env.business_error(500, "interaction handler error", false);

        assert_eq!(reply.kind, Kind::Response);
        assert_eq!(reply.event_name, "error");
        assert_eq!(reply.correlation_id, env.correlation_id);
        let data: ErrorData = reply.message.decode_data().unwrap();
        assert_eq!(data.code, 500);
        assert_eq!(data.message, "interaction handler error");
        assert!(!data.skip_retry);
        // scope is preserved from the request message
        assert_eq!(reply.message.workflow_id, env.message.workflow_id);
        assert_eq!(reply.message.message_type, MessageType::Interaction);
    }

    #[test]
    fn success_reply_preserves_identity_fields() {
        let env = request_envelope();
        let reply = env
            .success_reply(
                MessageType::Interaction,
                Some(Action::Update),
                &serde_json::json!({"id": "i-1"}),
            )
            .unwrap();

        assert_eq!(reply.kind, Kind::Response);
        assert_eq!(reply.event_name, "success");
        assert_eq!(reply.correlation_id, env.correlation_id);
        assert_eq!(reply.trace_id, env.trace_id);
        assert_eq!(reply.idempotency_key, env.idempotency_key);
    }

    #[test]
    fn wire_round_trip_preserves_all_fields() {
        let env = request_envelope();
        let bytes = env.to_json().unwrap();
        let back = Envelope::from_json(&bytes).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(Envelope::from_json(b"not json at all").is_err());
    }
}
