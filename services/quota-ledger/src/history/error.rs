use thiserror::Error;

use crate::ledger::UserValidationError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    User(#[from] UserValidationError),
    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
