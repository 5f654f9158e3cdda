use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ledger::{validate_user_id, DateProvider};
use crate::storage::KeyValueStore;

use super::error::HistoryError;
use super::item::{HistoryItem, NewHistoryItem};
use super::{DEFAULT_HISTORY_KEY_PREFIX, DEFAULT_HISTORY_LIMIT};

/// Per-user list of past results, newest first.
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn DateProvider>,
    key_prefix: String,
    limit: usize,
    user_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn DateProvider>) -> Self {
        Self::with_settings(store, clock, DEFAULT_HISTORY_KEY_PREFIX, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_settings(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn DateProvider>,
        key_prefix: impl Into<String>,
        limit: usize,
    ) -> Self {
        Self {
            store,
            clock,
            key_prefix: key_prefix.into(),
            limit: limit.max(1),
            user_locks: Arc::new(DashMap::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn list(&self, user_id: &str) -> Result<Vec<HistoryItem>, HistoryError> {
        validate_user_id(user_id)?;
        self.read(user_id)
    }

    pub fn get(&self, user_id: &str, id: &str) -> Result<Option<HistoryItem>, HistoryError> {
        Ok(self.list(user_id)?.into_iter().find(|item| item.id == id))
    }

    pub fn add(&self, user_id: &str, new_item: NewHistoryItem) -> Result<HistoryItem, HistoryError> {
        validate_user_id(user_id)?;
        let now = self.clock.now();
        let item = HistoryItem {
            id: Uuid::new_v4().to_string(),
            original: new_item.original,
            expanded: new_item.expanded,
            timestamp: now.timestamp_millis(),
            model: new_item.model,
            mode: new_item.mode,
        };

        self.update(user_id, |items| {
            items.insert(0, item.clone());
            items.truncate(self.limit);
        })?;

        debug!(user_id, id = %item.id, "added history item");
        Ok(item)
    }

    /// Returns whether an item was removed.
    pub fn remove(&self, user_id: &str, id: &str) -> Result<bool, HistoryError> {
        self.remove_many(user_id, &[id.to_string()])
            .map(|removed| removed > 0)
    }

    pub fn remove_many(&self, user_id: &str, ids: &[String]) -> Result<usize, HistoryError> {
        validate_user_id(user_id)?;
        let targets: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut removed = 0usize;

        self.update(user_id, |items| {
            let before = items.len();
            items.retain(|item| !targets.contains(item.id.as_str()));
            removed = before - items.len();
        })?;

        Ok(removed)
    }

    pub fn clear(&self, user_id: &str) -> Result<(), HistoryError> {
        validate_user_id(user_id)?;
        self.with_user_lock(user_id, || {
            self.store.remove(&self.storage_key(user_id))?;
            Ok(())
        })
    }

    fn storage_key(&self, user_id: &str) -> String {
        format!("{}{}", self.key_prefix, user_id)
    }

    fn read(&self, user_id: &str) -> Result<Vec<HistoryItem>, HistoryError> {
        let Some(raw) = self.store.get(&self.storage_key(user_id))? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<HistoryItem>>(&raw) {
            Ok(items) => Ok(items),
            Err(err) => {
                warn!(user_id, error = %err, "discarding unreadable history");
                Ok(Vec::new())
            }
        }
    }

    fn update(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut Vec<HistoryItem>),
    ) -> Result<(), HistoryError> {
        self.with_user_lock(user_id, || {
            let mut items = self.read(user_id)?;
            f(&mut items);
            let raw = serde_json::to_string(&items)?;
            self.store.set(&self.storage_key(user_id), &raw)?;
            Ok(())
        })
    }

    fn with_user_lock<T>(
        &self,
        user_id: &str,
        f: impl FnOnce() -> Result<T, HistoryError>,
    ) -> Result<T, HistoryError> {
        let lock = self
            .user_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f()
    }
}
