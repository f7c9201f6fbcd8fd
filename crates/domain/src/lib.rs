//! Aggregate update pipeline for conversations and interactions.
//!
//! Every accepted interaction mutation walks the same sequence: load, check
//! the caller's expected version, append an audit record of the state being
//! changed, then apply the mutation and persist through the version-guarded
//! store update. A version mismatch rejects the mutation before any side
//! effect; a losing concurrent writer surfaces a conflict instead of
//! overwriting.

pub mod conversation;
pub mod error;
pub mod history;
pub mod interaction;
pub mod requests;

pub use conversation::ConversationService;
pub use error::{DomainError, Result};
pub use history::HistoryService;
pub use interaction::{InteractionService, NewInteraction};
pub use requests::{ConversationRequest, Field, InteractionRequest};
