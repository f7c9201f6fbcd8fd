//! HTTP API server and broker consumer host for the conversation memory
//! service.
//!
//! Provides REST endpoints over the same aggregate services the broker
//! consumer dispatches to, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use storage::{ConversationStore, HistoryStore, InteractionStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::conversations::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<I, C, H>(
    state: Arc<AppState<I, C, H>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    I: InteractionStore + 'static,
    C: ConversationStore + 'static,
    H: HistoryStore + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/conversations", post(routes::conversations::create::<I, C, H>))
        .route("/conversations", get(routes::conversations::list::<I, C, H>))
        .route("/conversations/{id}", get(routes::conversations::get::<I, C, H>))
        .route(
            "/conversations/{id}",
            axum::routing::delete(routes::conversations::delete::<I, C, H>),
        )
        .route(
            "/conversations/{id}/interactions",
            get(routes::interactions::list_for_conversation::<I, C, H>),
        )
        .route("/interactions", post(routes::interactions::create::<I, C, H>))
        .route("/interactions/{id}", get(routes::interactions::get::<I, C, H>))
        .route("/interactions/{id}", patch(routes::interactions::update::<I, C, H>))
        .route(
            "/interactions/{id}",
            axum::routing::delete(routes::interactions::delete::<I, C, H>),
        )
        .route(
            "/interactions/{id}/history",
            get(routes::interactions::history::<I, C, H>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// State backed by the in-memory stores.
pub type InMemoryAppState = AppState<
    storage::InMemoryInteractionStore,
    storage::InMemoryConversationStore,
    storage::InMemoryHistoryStore,
>;

/// Creates application state over fresh in-memory stores.
///
/// The conversation and history stores are shared between the services so a
/// mutation through one surface is visible through the other.
pub fn create_default_state() -> Arc<InMemoryAppState> {
    use domain::{ConversationService, HistoryService, InteractionService};
    use storage::{InMemoryConversationStore, InMemoryHistoryStore, InMemoryInteractionStore};

    let conversation_store = InMemoryConversationStore::new();
    let history_store = InMemoryHistoryStore::new();

    let conversations = Arc::new(ConversationService::new(conversation_store.clone()));
    let history = Arc::new(HistoryService::new(history_store.clone()));
    let interactions = Arc::new(InteractionService::new(
        InMemoryInteractionStore::new(),
        ConversationService::new(conversation_store),
        HistoryService::new(history_store),
    ));

    Arc::new(AppState {
        conversations,
        interactions,
        history,
    })
}
