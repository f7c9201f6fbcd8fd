use thiserror::Error;

use domain::DomainError;
use messaging::{Action, MessagingError};

use crate::transport::TransportError;

/// Errors raised while routing a decoded envelope.
///
/// These never cross the consumer loop boundary as errors; the router
/// resolves every one of them into a response envelope.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The message's domain type tag names no known aggregate.
    #[error("Unknown message type: {0}")]
    UnknownType(String),

    /// The message carries no action tag.
    #[error("Missing action")]
    MissingAction,

    /// The action is not supported over the messaging path.
    #[error("Unsupported action: {0}")]
    UnsupportedAction(Action),

    /// A required request field was missing.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The payload could not be decoded into the request shape.
    #[error(transparent)]
    Messaging(#[from] MessagingError),

    /// The aggregate operation failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Errors internal to the consumer loop's publish step.
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),
}
