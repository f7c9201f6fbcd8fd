use thiserror::Error;

use common::Version;

/// Errors that can occur at the store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The entity does not exist.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// A version-guarded update lost the race: the expected version did not
    /// match the stored version. The caller must re-read and retry.
    #[error("Version conflict for {entity} {id}: expected {expected}, found {actual}")]
    VersionConflict {
        entity: &'static str,
        id: String,
        expected: Version,
        actual: Version,
    },

    /// The entity already exists (duplicate create).
    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    /// A serialization/deserialization error at the storage driver.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
