use std::sync::Arc;

use common::{Conversation, Interaction, Version};
use domain::{
    ConversationRequest, ConversationService, Field, InteractionRequest, InteractionService,
    NewInteraction,
};
use messaging::{Action, Envelope, Kind, Message, MessageType};
use storage::{ConversationStore, HistoryStore, InteractionStore};

use crate::error::RouterError;

/// Dispatches inbound envelopes to the aggregate services and packages the
/// result back into a response envelope.
///
/// Pure dispatch: no I/O of its own beyond what the services do. Every
/// failure is resolved into an error envelope here; the consumer loop never
/// sees a router error.
pub struct MessageRouter<I, C, H>
where
    I: InteractionStore,
    C: ConversationStore,
    H: HistoryStore,
{
    interactions: Arc<InteractionService<I, C, H>>,
    conversations: Arc<ConversationService<C>>,
}

impl<I, C, H> MessageRouter<I, C, H>
where
    I: InteractionStore,
    C: ConversationStore,
    H: HistoryStore,
{
    pub fn new(
        interactions: Arc<InteractionService<I, C, H>>,
        conversations: Arc<ConversationService<C>>,
    ) -> Self {
        Self {
            interactions,
            conversations,
        }
    }

    /// Handles one decoded envelope, always producing a response envelope.
    #[tracing::instrument(skip(self, envelope), fields(envelope_id = %envelope.id, correlation_id = %envelope.correlation_id))]
    pub async fn handle(&self, envelope: &Envelope) -> Envelope {
        if envelope.kind != Kind::Request {
            tracing::warn!(kind = ?envelope.kind, "refusing non-request envelope");
            return envelope.error_reply("unsupported-kind", true);
        }

        let message = &envelope.message;
        match &message.message_type {
            MessageType::Interaction => {
                match self.handle_interaction(message, message.action).await {
                    Ok(interaction) => self.success(envelope, MessageType::Interaction, &interaction),
                    Err(err) => self.failure(envelope, err),
                }
            }
            MessageType::Conversation => {
                match self.handle_conversation(message, message.action).await {
                    Ok(conversation) => {
                        self.success(envelope, MessageType::Conversation, &conversation)
                    }
                    Err(err) => self.failure(envelope, err),
                }
            }
            MessageType::Other(tag) => {
                self.failure(envelope, RouterError::UnknownType(tag.clone()))
            }
        }
    }

    fn success<T: serde::Serialize>(
        &self,
        envelope: &Envelope,
        message_type: MessageType,
        data: &T,
    ) -> Envelope {
        match envelope.success_reply(message_type, envelope.message.action, data) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(error = %err, "failed to build response message");
                envelope.business_error(500, "error creating response message", false)
            }
        }
    }

    /// Resolves a router error into a wire error envelope.
    ///
    /// Version conflicts and not-found are distinguishable by status code so
    /// callers can retry with a fresh read instead of treating them as
    /// transient infrastructure failure. The specific internal reason is
    /// logged here and never put on the wire.
    fn failure(&self, envelope: &Envelope, err: RouterError) -> Envelope {
        tracing::error!(error = %err, message_id = %envelope.message.id, "message handling failed");
        match &err {
            RouterError::Domain(domain_err) if domain_err.is_version_conflict() => {
                envelope.business_error(409, "version conflict", false)
            }
            RouterError::Domain(domain_err) if domain_err.is_not_found() => {
                envelope.business_error(404, "not found", false)
            }
            RouterError::UnknownType(_)
            | RouterError::MissingAction
            | RouterError::UnsupportedAction(_)
            | RouterError::MissingField(_)
            | RouterError::Messaging(_) => {
                envelope.business_error(500, "message is not valid for this handler", true)
            }
            RouterError::Domain(_) => envelope.business_error(500, "handler error", false),
        }
    }

    async fn handle_interaction(
        &self,
        message: &Message,
        action: Option<Action>,
    ) -> Result<Interaction, RouterError> {
        let action = action.ok_or(RouterError::MissingAction)?;
        let req: InteractionRequest = message.decode_data()?;

        match action {
            Action::Create => {
                let mut new = NewInteraction {
                    workflow_id: req.workflow_id,
                    session_id: req.session_id,
                    conversation_id: req.conversation_id,
                    ..Default::default()
                };
                match req.field {
                    Field::Context => new.context = req.data,
                    Field::Query => new.query = req.data,
                    Field::Answer => new.answer = req.data,
                }
                Ok(self.interactions.create(new).await?)
            }
            Action::Get => {
                let id = req
                    .interaction_id
                    .ok_or(RouterError::MissingField("interactionId"))?;
                Ok(self.interactions.get(id).await?)
            }
            Action::Update => {
                let id = req
                    .interaction_id
                    .ok_or(RouterError::MissingField("interactionId"))?;
                let expected = Version::new(req.version);
                let updated = match req.field {
                    Field::Context => {
                        self.interactions
                            .update_context(id, req.data, &req.actor, &req.action, expected)
                            .await?
                    }
                    Field::Query => {
                        self.interactions
                            .update_query(id, req.data, &req.actor, &req.action, expected)
                            .await?
                    }
                    Field::Answer => {
                        self.interactions
                            .update_answer(id, req.data, &req.actor, &req.action, expected)
                            .await?
                    }
                };
                Ok(updated)
            }
            other => Err(RouterError::UnsupportedAction(other)),
        }
    }

    async fn handle_conversation(
        &self,
        message: &Message,
        action: Option<Action>,
    ) -> Result<Conversation, RouterError> {
        let action = action.ok_or(RouterError::MissingAction)?;
        let req: ConversationRequest = message.decode_data()?;

        match action {
            Action::Create => {
                let conversation = self
                    .conversations
                    .create(
                        req.workflow_id.clone(),
                        req.session_id.clone(),
                        req.user_id.clone(),
                        vec![],
                    )
                    .await?;

                // An initial query seeds the first interaction, which links
                // its own stub back into the conversation.
                match req.data.filter(|stub| !stub.query.is_empty()) {
                    Some(stub) => {
                        self.interactions
                            .create(NewInteraction {
                                workflow_id: req.workflow_id,
                                session_id: req.session_id,
                                conversation_id: conversation.id,
                                query: stub.query,
                                ..Default::default()
                            })
                            .await?;
                        Ok(self.conversations.get(conversation.id).await?)
                    }
                    None => Ok(conversation),
                }
            }
            Action::Get => {
                let id = req
                    .conversation_id
                    .ok_or(RouterError::MissingField("conversationId"))?;
                Ok(self.conversations.get(id).await?)
            }
            Action::Update => {
                let id = req
                    .conversation_id
                    .ok_or(RouterError::MissingField("conversationId"))?;
                let stub = req.data.ok_or(RouterError::MissingField("data"))?;
                Ok(self.conversations.add_interaction(id, stub).await?)
            }
            other => Err(RouterError::UnsupportedAction(other)),
        }
    }
}
