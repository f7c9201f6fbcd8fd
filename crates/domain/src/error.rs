use thiserror::Error;

use storage::StoreError;

/// Errors produced by the aggregate services.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The addressed entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller's expected version did not match the stored version.
    /// Retry with a fresh read, not as a transient infrastructure failure.
    #[error("Version conflict for interaction {id}: expected {expected}, found {actual}")]
    VersionConflict {
        id: String,
        expected: common::Version,
        actual: common::Version,
    },

    /// A required request field was missing.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The store failed.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// A payload could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// True when the failure is an optimistic-concurrency conflict, at either
    /// the service check or the store's compare-and-swap.
    pub fn is_version_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::VersionConflict { .. } | DomainError::Store(StoreError::VersionConflict { .. })
        )
    }

    /// True when the failure means the entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::NotFound(_) | DomainError::Store(StoreError::NotFound(_))
        )
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => DomainError::NotFound(id),
            other => DomainError::Store(other),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
