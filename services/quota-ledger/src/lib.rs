pub mod api;
pub mod config;
pub mod history;
pub mod ledger;
pub mod storage;

pub use api::{create_router, ApiState, ErrorResponse, UserIdentity, USER_ID_HEADER};
pub use config::{LedgerConfig, StorageBackend};
pub use history::{AppMode, HistoryError, HistoryItem, HistoryStore, NewHistoryItem};
pub use ledger::{
    DateProvider, Feature, FixedClock, LedgerError, Plan, PlanDetails, PlanLimits, QuotaLedger,
    Remaining, SystemClock, UserValidationError,
};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, StorageError};
