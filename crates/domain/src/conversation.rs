use chrono::Utc;
use common::{Conversation, ConversationId, InteractionStub, Version};
use storage::ConversationStore;

use crate::error::Result;

/// Service for the conversation aggregate.
///
/// The conversation document is mutated as a whole: every write goes through
/// the store's version-guarded update, so two writers racing on the same
/// conversation cannot both win.
pub struct ConversationService<C: ConversationStore> {
    store: C,
}

impl<C: ConversationStore> ConversationService<C> {
    pub fn new(store: C) -> Self {
        Self { store }
    }

    /// Creates a conversation at version 1 with the given stub list.
    #[tracing::instrument(skip(self, interactions))]
    pub async fn create(
        &self,
        workflow_id: String,
        session_id: String,
        user_id: String,
        interactions: Vec<InteractionStub>,
    ) -> Result<Conversation> {
        let now = Utc::now();
        let conversation = Conversation {
            id: ConversationId::new(),
            workflow_id,
            session_id,
            user_id,
            interactions,
            version: Version::first(),
            created_at: now,
            updated_at: now,
        };
        Ok(self.store.insert(conversation).await?)
    }

    /// Loads a conversation by id.
    pub async fn get(&self, id: ConversationId) -> Result<Conversation> {
        Ok(self.store.get(id).await?)
    }

    /// Lists a user's conversations.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<Conversation>> {
        Ok(self.store.list_by_user(user_id).await?)
    }

    /// Merges a stub into a conversation's interaction list.
    ///
    /// A stub with an id already in the list has its answer updated in place;
    /// a new id is appended at the end, preserving insertion order. Either
    /// way the whole document is persisted through the version-guarded update
    /// path, with the guard on the document version, not per stub.
    #[tracing::instrument(skip(self, stub), fields(interaction_id = %stub.id))]
    pub async fn add_interaction(
        &self,
        conversation_id: ConversationId,
        stub: InteractionStub,
    ) -> Result<Conversation> {
        let mut conversation = self.store.get(conversation_id).await?;
        let loaded_version = conversation.version;

        match conversation.interactions.iter_mut().find(|s| s.id == stub.id) {
            Some(existing) => existing.answer = stub.answer,
            None => conversation.interactions.push(stub),
        }

        conversation.version = loaded_version.next();
        conversation.updated_at = Utc::now();
        Ok(self.store.update(conversation, loaded_version).await?)
    }

    /// Deletes a conversation by id.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ConversationId) -> Result<()> {
        Ok(self.store.delete(id).await?)
    }
}
