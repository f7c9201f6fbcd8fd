//! Shared types for the conversation memory service: the versioned
//! aggregates (conversation, interaction, history) and the identifier and
//! version newtypes they are keyed by.
//!
//! Identifiers generated by this service are UUID-backed newtypes so that a
//! conversation id can never be handed to an interaction lookup by accident.
//! Workflow and session ids are owned by upstream callers and stay plain
//! strings on the entities that carry them.

pub mod entities;
pub mod ids;
pub mod version;

pub use entities::{Conversation, Interaction, InteractionHistory, InteractionStub};
pub use ids::{ConversationId, HistoryId, InteractionId};
pub use version::Version;
