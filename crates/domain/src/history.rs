use common::{HistoryId, Interaction, InteractionHistory, InteractionId};
use storage::HistoryStore;

use crate::error::Result;

/// Service for the append-only interaction audit trail.
///
/// Records are only ever appended; there is no mutation path at all, which is
/// what makes the trail a trustworthy account of what happened.
pub struct HistoryService<H: HistoryStore> {
    store: H,
}

impl<H: HistoryStore> HistoryService<H> {
    pub fn new(store: H) -> Self {
        Self { store }
    }

    /// Appends a record capturing the interaction's current state together
    /// with the actor and action about to change it.
    #[tracing::instrument(skip(self, interaction), fields(interaction_id = %interaction.id))]
    pub async fn add_for_interaction(
        &self,
        interaction: &Interaction,
        actor: &str,
        action: &str,
    ) -> Result<InteractionHistory> {
        let record = InteractionHistory::capture(interaction, actor, action);
        Ok(self.store.append(record).await?)
    }

    /// Loads a single history record by id.
    pub async fn get(&self, id: HistoryId) -> Result<InteractionHistory> {
        Ok(self.store.get(id).await?)
    }

    /// Lists an interaction's history in version order.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_interaction(
        &self,
        interaction_id: InteractionId,
    ) -> Result<Vec<InteractionHistory>> {
        Ok(self.store.list_by_interaction(interaction_id).await?)
    }
}
