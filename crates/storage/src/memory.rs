use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use common::{
    Conversation, ConversationId, HistoryId, Interaction, InteractionHistory, InteractionId,
    Version,
};

use crate::error::{Result, StoreError};
use crate::store::{ConversationStore, HistoryStore, InteractionStore};

/// In-memory conversation store for tests and local runs.
///
/// Provides the same version-guarded update semantics as the document-store
/// implementation.
#[derive(Clone, Default)]
pub struct InMemoryConversationStore {
    docs: Arc<RwLock<HashMap<ConversationId, Conversation>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.docs.read().await.len()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, id: ConversationId) -> Result<Conversation> {
        let docs = self.docs.read().await;
        docs.get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn insert(&self, conversation: Conversation) -> Result<Conversation> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(&conversation.id) {
            return Err(StoreError::AlreadyExists(conversation.id.to_string()));
        }
        docs.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn update(&self, conversation: Conversation, expected: Version) -> Result<Conversation> {
        let mut docs = self.docs.write().await;
        let current = docs
            .get(&conversation.id)
            .ok_or_else(|| StoreError::NotFound(conversation.id.to_string()))?;
        if current.version != expected {
            return Err(StoreError::VersionConflict {
                entity: "conversation",
                id: conversation.id.to_string(),
                expected,
                actual: current.version,
            });
        }
        docs.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn delete(&self, id: ConversationId) -> Result<()> {
        let mut docs = self.docs.write().await;
        docs.remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let docs = self.docs.read().await;
        let mut list: Vec<_> = docs
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by_key(|c| c.created_at);
        Ok(list)
    }
}

/// In-memory interaction store for tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryInteractionStore {
    docs: Arc<RwLock<HashMap<InteractionId, Interaction>>>,
}

impl InMemoryInteractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.docs.read().await.len()
    }
}

#[async_trait]
impl InteractionStore for InMemoryInteractionStore {
    async fn get(&self, id: InteractionId) -> Result<Interaction> {
        let docs = self.docs.read().await;
        docs.get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn insert(&self, interaction: Interaction) -> Result<Interaction> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(&interaction.id) {
            return Err(StoreError::AlreadyExists(interaction.id.to_string()));
        }
        docs.insert(interaction.id, interaction.clone());
        Ok(interaction)
    }

    async fn update(&self, interaction: Interaction, expected: Version) -> Result<Interaction> {
        let mut docs = self.docs.write().await;
        let current = docs
            .get(&interaction.id)
            .ok_or_else(|| StoreError::NotFound(interaction.id.to_string()))?;
        if current.version != expected {
            return Err(StoreError::VersionConflict {
                entity: "interaction",
                id: interaction.id.to_string(),
                expected,
                actual: current.version,
            });
        }
        docs.insert(interaction.id, interaction.clone());
        Ok(interaction)
    }

    async fn delete(&self, id: InteractionId) -> Result<()> {
        let mut docs = self.docs.write().await;
        docs.remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Interaction>> {
        let docs = self.docs.read().await;
        let mut list: Vec<_> = docs
            .values()
            .filter(|i| i.conversation_id == conversation_id)
            .cloned()
            .collect();
        list.sort_by_key(|i| i.created_at);
        Ok(list)
    }
}

/// In-memory append-only history store.
#[derive(Clone, Default)]
pub struct InMemoryHistoryStore {
    records: Arc<RwLock<Vec<InteractionHistory>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, record: InteractionHistory) -> Result<InteractionHistory> {
        let mut records = self.records.write().await;
        records.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: HistoryId) -> Result<InteractionHistory> {
        let records = self.records.read().await;
        records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list_by_interaction(
        &self,
        interaction_id: InteractionId,
    ) -> Result<Vec<InteractionHistory>> {
        let records = self.records.read().await;
        let mut list: Vec<_> = records
            .iter()
            .filter(|r| r.interaction_id == interaction_id)
            .cloned()
            .collect();
        list.sort_by_key(|r| r.version);
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn interaction(version: Version) -> Interaction {
        Interaction {
            id: InteractionId::new(),
            workflow_id: "wf-1".to_string(),
            session_id: "s-1".to_string(),
            conversation_id: ConversationId::new(),
            context: String::new(),
            query: "What is X?".to_string(),
            answer: String::new(),
            version,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn get_missing_interaction_is_not_found() {
        let store = InMemoryInteractionStore::new();
        let result = store.get(InteractionId::new()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let store = InMemoryInteractionStore::new();
        let doc = interaction(Version::first());
        store.insert(doc.clone()).await.unwrap();
        let result = store.insert(doc).await;
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn update_with_matching_version_replaces_document() {
        let store = InMemoryInteractionStore::new();
        let mut doc = interaction(Version::first());
        store.insert(doc.clone()).await.unwrap();

        doc.answer = "X is Y".to_string();
        doc.version = doc.version.next();
        let updated = store.update(doc.clone(), Version::first()).await.unwrap();
        assert_eq!(updated.version, Version::new(2));
        assert_eq!(store.get(doc.id).await.unwrap().answer, "X is Y");
    }

    #[tokio::test]
    async fn update_with_stale_version_conflicts_and_leaves_document() {
        let store = InMemoryInteractionStore::new();
        let mut doc = interaction(Version::new(3));
        store.insert(doc.clone()).await.unwrap();

        let id = doc.id;
        doc.answer = "stale write".to_string();
        doc.version = Version::new(3);
        let result = store.update(doc, Version::new(2)).await;

        assert!(matches!(
            result,
            Err(StoreError::VersionConflict {
                expected,
                actual,
                ..
            }) if expected == Version::new(2) && actual == Version::new(3)
        ));
        assert_eq!(store.get(id).await.unwrap().answer, "");
    }

    #[tokio::test]
    async fn history_lists_in_version_order() {
        let store = InMemoryHistoryStore::new();
        let doc = interaction(Version::first());
        let mut v2 = doc.clone();
        v2.version = Version::new(2);

        store
            .append(InteractionHistory::capture(&v2, "actor", "update"))
            .await
            .unwrap();
        store
            .append(InteractionHistory::capture(&doc, "actor", "update"))
            .await
            .unwrap();

        let list = store.list_by_interaction(doc.id).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].version, Version::first());
        assert_eq!(list[1].version, Version::new(2));
    }

    #[tokio::test]
    async fn list_by_conversation_filters_other_conversations() {
        let store = InMemoryInteractionStore::new();
        let a = interaction(Version::first());
        let b = interaction(Version::first());
        store.insert(a.clone()).await.unwrap();
        store.insert(b).await.unwrap();

        let list = store.list_by_conversation(a.conversation_id).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, a.id);
    }
}
