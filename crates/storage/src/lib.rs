//! Store trait boundary for conversation aggregates.
//!
//! The production document store lives behind these traits as an external
//! collaborator; this crate defines the narrow capability set each service
//! needs ([`ConversationStore`], [`InteractionStore`], [`HistoryStore`]) plus
//! in-memory implementations used by tests and local runs.
//!
//! Updates are version-guarded at this boundary. Loading and checking in the
//! service layer is not enough under concurrent writers (a REST call and a
//! message-driven update can land at the same time); the compare-and-swap in
//! the store is the only true serialization point, and a losing writer must
//! observe [`StoreError::VersionConflict`], never silently overwrite.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryConversationStore, InMemoryHistoryStore, InMemoryInteractionStore};
pub use store::{ConversationStore, HistoryStore, InteractionStore};
