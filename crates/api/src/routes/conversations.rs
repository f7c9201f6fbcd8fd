//! Conversation endpoints and shared application state.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Conversation, ConversationId};
use domain::{ConversationService, HistoryService, InteractionService, NewInteraction};
use serde::Deserialize;
use storage::{ConversationStore, HistoryStore, InteractionStore};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
///
/// The same service instances back the broker consumer, so REST and messaging
/// traffic contend on the same version-guarded store updates.
pub struct AppState<I, C, H>
where
    I: InteractionStore,
    C: ConversationStore,
    H: HistoryStore,
{
    pub conversations: Arc<ConversationService<C>>,
    pub interactions: Arc<InteractionService<I, C, H>>,
    pub history: Arc<HistoryService<H>>,
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub workflow_id: String,
    pub session_id: String,
    pub user_id: String,
    /// Seeds the conversation's first interaction when present.
    #[serde(default)]
    pub initial_query: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListConversationsParams {
    pub user_id: String,
}

// -- Handlers --

/// POST /conversations — create a conversation, optionally seeded with a
/// first interaction.
#[tracing::instrument(skip(state, req))]
pub async fn create<I, C, H>(
    State(state): State<Arc<AppState<I, C, H>>>,
    Json(req): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<Conversation>), ApiError>
where
    I: InteractionStore + 'static,
    C: ConversationStore + 'static,
    H: HistoryStore + 'static,
{
    let conversation = state
        .conversations
        .create(
            req.workflow_id.clone(),
            req.session_id.clone(),
            req.user_id,
            vec![],
        )
        .await?;

    let conversation = match req.initial_query.filter(|q| !q.is_empty()) {
        Some(query) => {
            state
                .interactions
                .create(NewInteraction {
                    workflow_id: req.workflow_id,
                    session_id: req.session_id,
                    conversation_id: conversation.id,
                    query,
                    ..Default::default()
                })
                .await?;
            state.conversations.get(conversation.id).await?
        }
        None => conversation,
    };

    Ok((StatusCode::CREATED, Json(conversation)))
}

/// GET /conversations/:id — load a conversation by id.
#[tracing::instrument(skip(state))]
pub async fn get<I, C, H>(
    State(state): State<Arc<AppState<I, C, H>>>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, ApiError>
where
    I: InteractionStore + 'static,
    C: ConversationStore + 'static,
    H: HistoryStore + 'static,
{
    let id = parse_conversation_id(&id)?;
    Ok(Json(state.conversations.get(id).await?))
}

/// GET /conversations?userId=… — list a user's conversations.
#[tracing::instrument(skip(state))]
pub async fn list<I, C, H>(
    State(state): State<Arc<AppState<I, C, H>>>,
    Query(params): Query<ListConversationsParams>,
) -> Result<Json<Vec<Conversation>>, ApiError>
where
    I: InteractionStore + 'static,
    C: ConversationStore + 'static,
    H: HistoryStore + 'static,
{
    Ok(Json(state.conversations.list_by_user(&params.user_id).await?))
}

/// DELETE /conversations/:id — delete a conversation.
#[tracing::instrument(skip(state))]
pub async fn delete<I, C, H>(
    State(state): State<Arc<AppState<I, C, H>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    I: InteractionStore + 'static,
    C: ConversationStore + 'static,
    H: HistoryStore + 'static,
{
    let id = parse_conversation_id(&id)?;
    state.conversations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn parse_conversation_id(id: &str) -> Result<ConversationId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid conversation id: {e}")))?;
    Ok(ConversationId::from_uuid(uuid))
}
