//! Error types for the Warden system.

use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WardenError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity} with key {key}")]
    AlreadyExists { entity: String, key: String },

    #[error("Resource version mismatch")]
    BadVersion,

    #[error("Entity belongs to a different origin")]
    BadOrigin,

    #[error("Role is project scoped")]
    BadProjectScopeRole,

    #[error("Malformed member notation: {0}")]
    MalformedMember(String),

    #[error("Entity is archived")]
    IsArchived,

    #[error("Entity is not archived")]
    IsNotArchived,

    #[error("Entity {entity} with id {id} is still referenced")]
    ForeignKey { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WardenError {
    pub fn not_found(entity: &str, id: impl Display) -> Self {
        Self::NotFound {
            entity: entity.to_owned(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type WardenResult<T> = Result<T, WardenError>;
