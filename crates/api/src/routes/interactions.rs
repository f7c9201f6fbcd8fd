//! Interaction endpoints, including the audit history listing.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Interaction, InteractionHistory, InteractionId, Version};
use domain::{Field, NewInteraction};
use serde::Deserialize;
use storage::{ConversationStore, HistoryStore, InteractionStore};

use crate::error::ApiError;
use crate::routes::conversations::{AppState, parse_conversation_id};

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInteractionRequest {
    pub workflow_id: String,
    pub session_id: String,
    pub conversation_id: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInteractionRequest {
    /// Which field to replace.
    #[serde(rename = "type")]
    pub field: Field,
    pub data: String,
    #[serde(default)]
    pub actor: String,
    #[serde(default)]
    pub action: String,
    /// The version the caller last observed.
    pub version: i64,
}

// -- Handlers --

/// POST /interactions — create an interaction linked to its conversation.
#[tracing::instrument(skip(state, req))]
pub async fn create<I, C, H>(
    State(state): State<Arc<AppState<I, C, H>>>,
    Json(req): Json<CreateInteractionRequest>,
) -> Result<(StatusCode, Json<Interaction>), ApiError>
where
    I: InteractionStore + 'static,
    C: ConversationStore + 'static,
    H: HistoryStore + 'static,
{
    let conversation_id = parse_conversation_id(&req.conversation_id)?;
    let interaction = state
        .interactions
        .create(NewInteraction {
            workflow_id: req.workflow_id,
            session_id: req.session_id,
            conversation_id,
            context: req.context,
            query: req.query,
            answer: req.answer,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(interaction)))
}

/// GET /interactions/:id — load an interaction by id.
#[tracing::instrument(skip(state))]
pub async fn get<I, C, H>(
    State(state): State<Arc<AppState<I, C, H>>>,
    Path(id): Path<String>,
) -> Result<Json<Interaction>, ApiError>
where
    I: InteractionStore + 'static,
    C: ConversationStore + 'static,
    H: HistoryStore + 'static,
{
    let id = parse_interaction_id(&id)?;
    Ok(Json(state.interactions.get(id).await?))
}

/// GET /conversations/:id/interactions — list a conversation's interactions.
#[tracing::instrument(skip(state))]
pub async fn list_for_conversation<I, C, H>(
    State(state): State<Arc<AppState<I, C, H>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Interaction>>, ApiError>
where
    I: InteractionStore + 'static,
    C: ConversationStore + 'static,
    H: HistoryStore + 'static,
{
    let id = parse_conversation_id(&id)?;
    Ok(Json(state.interactions.list_by_conversation(id).await?))
}

/// PATCH /interactions/:id — replace one field, guarded by the caller's
/// expected version. A stale version yields 409.
#[tracing::instrument(skip(state, req))]
pub async fn update<I, C, H>(
    State(state): State<Arc<AppState<I, C, H>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateInteractionRequest>,
) -> Result<Json<Interaction>, ApiError>
where
    I: InteractionStore + 'static,
    C: ConversationStore + 'static,
    H: HistoryStore + 'static,
{
    let id = parse_interaction_id(&id)?;
    let expected = Version::new(req.version);
    let updated = match req.field {
        Field::Context => {
            state
                .interactions
                .update_context(id, req.data, &req.actor, &req.action, expected)
                .await?
        }
        Field::Query => {
            state
                .interactions
                .update_query(id, req.data, &req.actor, &req.action, expected)
                .await?
        }
        Field::Answer => {
            state
                .interactions
                .update_answer(id, req.data, &req.actor, &req.action, expected)
                .await?
        }
    };
    Ok(Json(updated))
}

/// DELETE /interactions/:id — delete an interaction. Its history records
/// remain; the trail outlives the entity.
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
    let id = parse_interaction_id(&id)?;
    state.interactions.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /interactions/:id/history — list an interaction's audit records in
/// version order.
#[tracing::instrument(skip(state))]
pub async fn history<I, C, H>(
    State(state): State<Arc<AppState<I, C, H>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<InteractionHistory>>, ApiError>
where
    I: InteractionStore + 'static,
    C: ConversationStore + 'static,
    H: HistoryStore + 'static,
{
    let id = parse_interaction_id(&id)?;
    Ok(Json(state.history.list_for_interaction(id).await?))
}

fn parse_interaction_id(id: &str) -> Result<InteractionId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid interaction id: {e}")))?;
    Ok(InteractionId::from_uuid(uuid))
}
