use thiserror::Error;

use crate::storage::StorageError;

use super::plan::Feature;
use super::user::UserValidationError;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    User(#[from] UserValidationError),
    #[error("usage amount must be greater than zero")]
    InvalidAmount,
    #[error("quota exceeded for {feature}: limit={limit}, current={current}, cost={cost}")]
    QuotaExceeded {
        feature: Feature,
        limit: u64,
        current: u64,
        cost: u64,
    },
    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
