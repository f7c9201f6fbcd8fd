use chrono::Utc;
use common::{ConversationId, Interaction, InteractionId, InteractionStub, Version};
use storage::{ConversationStore, HistoryStore, InteractionStore};

use crate::conversation::ConversationService;
use crate::error::{DomainError, Result};
use crate::history::HistoryService;
use crate::requests::Field;

/// Fields for a new interaction.
#[derive(Debug, Clone, Default)]
pub struct NewInteraction {
    pub workflow_id: String,
    pub session_id: String,
    pub conversation_id: ConversationId,
    pub context: String,
    pub query: String,
    pub answer: String,
}

/// Service for the interaction aggregate.
///
/// Mutations follow one pipeline: load, check the caller's expected version,
/// append the audit record of the state being changed, then apply the field
/// mutation and persist through the version-guarded store update. A mismatch
/// at the version check rejects the mutation before any write happens.
pub struct InteractionService<I, C, H>
where
    I: InteractionStore,
    C: ConversationStore,
    H: HistoryStore,
{
    store: I,
    conversations: ConversationService<C>,
    history: HistoryService<H>,
}

impl<I, C, H> InteractionService<I, C, H>
where
    I: InteractionStore,
    C: ConversationStore,
    H: HistoryStore,
{
    pub fn new(store: I, conversations: ConversationService<C>, history: HistoryService<H>) -> Self {
        Self {
            store,
            conversations,
            history,
        }
    }

    /// Creates an interaction at version 1 and links its stub into the parent
    /// conversation's list.
    ///
    /// The two writes are not one storage transaction: a crash between them
    /// leaves a stored interaction without a stub until the next merge. A
    /// failing stub link is propagated to the caller, never dropped.
    #[tracing::instrument(skip(self, new), fields(conversation_id = %new.conversation_id))]
    pub async fn create(&self, new: NewInteraction) -> Result<Interaction> {
        let now = Utc::now();
        let interaction = Interaction {
            id: InteractionId::new(),
            workflow_id: new.workflow_id,
            session_id: new.session_id,
            conversation_id: new.conversation_id,
            context: new.context,
            query: new.query,
            answer: new.answer,
            version: Version::first(),
            created_at: now,
            updated_at: now,
        };
        let created = self.store.insert(interaction).await?;

        let stub = InteractionStub {
            id: created.id,
            query: created.query.clone(),
            answer: created.answer.clone(),
        };
        self.conversations
            .add_interaction(created.conversation_id, stub)
            .await?;

        Ok(created)
    }

    /// Loads an interaction by id.
    pub async fn get(&self, id: InteractionId) -> Result<Interaction> {
        Ok(self.store.get(id).await?)
    }

    /// Lists a conversation's interactions.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Interaction>> {
        Ok(self.store.list_by_conversation(conversation_id).await?)
    }

    /// Replaces the interaction's context.
    pub async fn update_context(
        &self,
        id: InteractionId,
        value: String,
        actor: &str,
        action: &str,
        expected_version: Version,
    ) -> Result<Interaction> {
        self.apply_update(id, Field::Context, value, actor, action, expected_version)
            .await
    }

    /// Replaces the interaction's query.
    pub async fn update_query(
        &self,
        id: InteractionId,
        value: String,
        actor: &str,
        action: &str,
        expected_version: Version,
    ) -> Result<Interaction> {
        self.apply_update(id, Field::Query, value, actor, action, expected_version)
            .await
    }

    /// Replaces the interaction's answer.
    pub async fn update_answer(
        &self,
        id: InteractionId,
        value: String,
        actor: &str,
        action: &str,
        expected_version: Version,
    ) -> Result<Interaction> {
        self.apply_update(id, Field::Answer, value, actor, action, expected_version)
            .await
    }

    /// Deletes an interaction by id.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: InteractionId) -> Result<()> {
        Ok(self.store.delete(id).await?)
    }

    #[tracing::instrument(skip(self, value), fields(field = field.as_str()))]
    async fn apply_update(
        &self,
        id: InteractionId,
        field: Field,
        value: String,
        actor: &str,
        action: &str,
        expected_version: Version,
    ) -> Result<Interaction> {
        let interaction = self.store.get(id).await?;

        if interaction.version != expected_version {
            tracing::warn!(
                expected = %expected_version,
                actual = %interaction.version,
                "rejecting {} update on version mismatch",
                field.as_str()
            );
            return Err(DomainError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
                actual: interaction.version,
            });
        }

        // The audit record must land before the mutation: it captures the
        // state being changed, not already-changed state.
        self.history
            .add_for_interaction(&interaction, actor, action)
            .await?;

        let mut updated = interaction;
        match field {
            Field::Context => updated.context = value,
            Field::Query => updated.query = value,
            Field::Answer => updated.answer = value,
        }
        updated.version = expected_version.next();
        updated.updated_at = Utc::now();

        Ok(self.store.update(updated, expected_version).await?)
    }
}
