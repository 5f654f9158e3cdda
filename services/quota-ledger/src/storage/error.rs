use std::io;

use rusqlite;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
    #[error("storage connection poisoned")]
    Poisoned,
}
