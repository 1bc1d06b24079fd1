//! Errors surfaced by the warden process.

use thiserror::Error;
use warden_core::error::WardenError;
use warden_db::DbError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Cannot read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Db(#[from] DbError),

    #[error(transparent)]
    Warden(#[from] WardenError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
