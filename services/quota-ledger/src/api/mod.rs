use std::sync::Arc;

use anyhow::{Context, Result};

pub mod auth;
pub mod handlers;
pub mod router;
pub mod types;

pub use auth::{UserIdentity, USER_ID_HEADER};
pub use router::create_router;
pub use types::*;

use crate::config::{LedgerConfig, StorageBackend};
use crate::history::HistoryStore;
use crate::ledger::{DateProvider, QuotaLedger, SystemClock};
use crate::storage::{KeyValueStore, MemoryStore, SqliteStore};

pub struct ApiState {
    pub ledger: QuotaLedger,
    pub history: HistoryStore,
}

impl ApiState {
    pub fn new(ledger: QuotaLedger, history: HistoryStore) -> Self {
        Self { ledger, history }
    }

    /// Opens the configured backend and wires the ledger and history store
    /// onto it with the system clock.
    pub fn from_config(config: LedgerConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match config.storage_backend {
            StorageBackend::Sqlite => Arc::new(
                SqliteStore::new(&config.data_dir).with_context(|| {
                    format!("opening ledger database in {}", config.data_dir.display())
                })?,
            ),
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(Self::with_store(store, Arc::new(SystemClock), &config))
    }

    pub fn with_store(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn DateProvider>,
        config: &LedgerConfig,
    ) -> Self {
        let ledger = QuotaLedger::with_key_prefix(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.plan_key_prefix.clone(),
        );
        let history = HistoryStore::with_settings(
            store,
            clock,
            config.history_key_prefix.clone(),
            config.history_limit,
        );
        Self::new(ledger, history)
    }
}
