//! Envelope wire protocol for messages exchanged over the broker.
//!
//! An [`Envelope`] is the messaging-level transport unit: kind, retry
//! bookkeeping, correlation and trace identifiers. The [`Message`] inside it
//! is the domain-level payload naming the aggregate type and action.
//!
//! ```text
//! ┌────────────────────────────┐
//! │        Envelope            │
//! │ kind: request              │  ← messaging-level
//! │ traceId, correlationId ... │
//! │   ┌────────────────────┐   │
//! │   │     Message        │   │
//! │   │ type: conversation │   │  ← domain-level
//! │   │ action: update     │   │
//! │   │ data: {...}        │   │
//! │   └────────────────────┘   │
//! └────────────────────────────┘
//! ```

pub mod envelope;
pub mod error;
pub mod message;

pub use envelope::{AuthInfo, Envelope, EnvelopeBuilder, Kind, Principal, SCHEMA_VERSION};
pub use error::{MessagingError, Result};
pub use message::{Action, ErrorData, Message, MessageType};
