pub mod database;
pub mod error;
pub mod memory;
pub mod schema;

pub use database::SqliteStore;
pub use error::StorageError;
pub use memory::MemoryStore;

pub const LEDGER_DB_FILENAME: &str = "ledger.db";

/// String-keyed persistence the ledger and history store write through.
///
/// Implementations must be safe to share across request handlers; callers
/// that need read-modify-write atomicity serialize access themselves.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
