//! Store-specific error types and conversions.

use warden_core::error::WardenError;

/// Store-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique index {index} violated on {entity}: {value}")]
    UniqueViolation {
        entity: String,
        index: String,
        value: String,
    },

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl From<DbError> for WardenError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => WardenError::NotFound { entity, id },
            DbError::UniqueViolation { entity, value, .. } => {
                WardenError::AlreadyExists { entity, key: value }
            }
            other => WardenError::Database(other.to_string()),
        }
    }
}
