use thiserror::Error;

/// Errors that can occur while encoding or decoding protocol types.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// A payload could not be serialized or an envelope could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A handler required a payload but the message carried none.
    #[error("Message {message_id} has no payload")]
    EmptyPayload { message_id: String },
}

/// Result type for messaging operations.
pub type Result<T> = std::result::Result<T, MessagingError>;
