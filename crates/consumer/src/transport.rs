use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// A raw message as fetched from the broker, before envelope decoding.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Vec<u8>,
    pub payload: Vec<u8>,
    /// Per-message header key/value pairs; carries trace propagation.
    pub headers: HashMap<String, String>,
}

/// Errors at the broker transport boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Fetching the next message failed. Recoverable: the consumer backs off
    /// and retries without committing anything.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Writing to the outbound topic failed.
    #[error("Publish error: {0}")]
    Publish(String),

    /// Committing a processed offset failed. The message will be redelivered
    /// on the next rebalance or restart.
    #[error("Commit error: {0}")]
    Commit(String),

    /// The underlying reader or writer has been closed.
    #[error("Transport closed")]
    Closed,
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// A subscribed reader on the inbound topic.
///
/// Implementations must be safe for concurrent calls; the consumer loop and
/// its cancellation path share one instance.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Blocks until the next undelivered message is available.
    async fn fetch(&self) -> Result<RawMessage>;

    /// Marks the message's offset as processed.
    async fn commit(&self, message: &RawMessage) -> Result<()>;

    /// Tears down the underlying reader; subsequent fetches fail with
    /// [`TransportError::Closed`].
    async fn close(&self);
}

/// A writer on the outbound response topic.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Writes one message and awaits broker acknowledgment.
    async fn publish(&self, key: Vec<u8>, payload: Vec<u8>) -> Result<()>;
}
