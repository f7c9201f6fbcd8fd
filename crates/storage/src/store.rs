use async_trait::async_trait;

use common::{
    Conversation, ConversationId, HistoryId, Interaction, InteractionHistory, InteractionId,
    Version,
};

use crate::Result;

/// Store capability for conversation aggregates.
///
/// All implementations must be safe for concurrent calls (Send + Sync); the
/// consumer loop and the REST layer share one instance.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Loads a conversation by id, failing with `NotFound` if absent.
    async fn get(&self, id: ConversationId) -> Result<Conversation>;

    /// Persists a new conversation document.
    async fn insert(&self, conversation: Conversation) -> Result<Conversation>;

    /// Replaces the stored document, but only if its current version equals
    /// `expected`. The caller supplies the document with the version already
    /// bumped; on mismatch the store returns `VersionConflict` and leaves the
    /// stored document untouched.
    async fn update(&self, conversation: Conversation, expected: Version) -> Result<Conversation>;

    /// Deletes a conversation by id.
    async fn delete(&self, id: ConversationId) -> Result<()>;

    /// Lists conversations belonging to a user.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Conversation>>;
}

/// Store capability for interaction aggregates.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Loads an interaction by id, failing with `NotFound` if absent.
    async fn get(&self, id: InteractionId) -> Result<Interaction>;

    /// Persists a new interaction document.
    async fn insert(&self, interaction: Interaction) -> Result<Interaction>;

    /// Version-guarded replace; see [`ConversationStore::update`].
    async fn update(&self, interaction: Interaction, expected: Version) -> Result<Interaction>;

    /// Deletes an interaction by id.
    async fn delete(&self, id: InteractionId) -> Result<()>;

    /// Lists interactions belonging to a conversation.
    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Interaction>>;
}

/// Store capability for the append-only interaction audit trail.
///
/// There is deliberately no update or delete here: history records are
/// immutable and permanent once appended.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Appends a new history record.
    async fn append(&self, record: InteractionHistory) -> Result<InteractionHistory>;

    /// Loads a history record by id, failing with `NotFound` if absent.
    async fn get(&self, id: HistoryId) -> Result<InteractionHistory>;

    /// Lists history records for an interaction in version order.
    async fn list_by_interaction(
        &self,
        interaction_id: InteractionId,
    ) -> Result<Vec<InteractionHistory>>;
}
