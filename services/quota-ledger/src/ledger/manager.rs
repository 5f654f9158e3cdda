use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::storage::KeyValueStore;

use super::clock::DateProvider;
use super::error::LedgerError;
use super::plan::{Feature, Plan, Remaining};
use super::record::PlanDetails;
use super::user::validate_user_id;
use super::DEFAULT_PLAN_KEY_PREFIX;

/// Gates and records daily feature usage against each user's plan.
///
/// Every read-modify-write of a user's record runs under that user's lock,
/// so concurrent sessions for one user cannot lose updates.
#[derive(Clone)]
pub struct QuotaLedger {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn DateProvider>,
    key_prefix: String,
    user_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl QuotaLedger {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn DateProvider>) -> Self {
        Self::with_key_prefix(store, clock, DEFAULT_PLAN_KEY_PREFIX)
    }

    pub fn with_key_prefix(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn DateProvider>,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            key_prefix: key_prefix.into(),
            user_locks: Arc::new(DashMap::new()),
        }
    }

    pub fn storage_key(&self, user_id: &str) -> String {
        format!("{}{}", self.key_prefix, user_id)
    }

    /// Returns the user's record for today's usage window, creating a Free
    /// record on first sight. The result is always persisted.
    pub fn load_or_initialize(&self, user_id: &str) -> Result<PlanDetails, LedgerError> {
        validate_user_id(user_id)?;
        self.with_user_lock(user_id, || {
            let (record, _) = self.read_current(user_id)?;
            self.persist(user_id, &record)?;
            Ok(record)
        })
    }

    /// Whether `cost` more units of `feature` fit under the record's plan
    /// limit for today. Has no side effects.
    pub fn can_use_feature(&self, record: &PlanDetails, feature: Feature, cost: u64) -> bool {
        record.normalized(self.clock.today()).can_use(feature, cost)
    }

    /// Adds `amount` to today's counter for `feature`.
    ///
    /// Does not check the limit; pair with [`Self::can_use_feature`] or use
    /// [`Self::try_consume`]. Unlimited plans keep zero counters.
    pub fn record_usage(
        &self,
        user_id: &str,
        feature: Feature,
        amount: u64,
    ) -> Result<PlanDetails, LedgerError> {
        validate_user_id(user_id)?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        self.with_user_lock(user_id, || {
            let (mut record, changed) = self.read_current(user_id)?;
            if record.plan == Plan::Unlimited {
                if changed {
                    self.persist(user_id, &record)?;
                }
                return Ok(record);
            }

            record.add_usage(feature, amount);
            self.persist(user_id, &record)?;

            debug!(
                user_id,
                feature = %feature,
                amount,
                used = record.usage(feature),
                "recorded feature usage"
            );
            Ok(record)
        })
    }

    /// Checks and records in one step, refusing usage that would pass the
    /// plan limit.
    pub fn try_consume(
        &self,
        user_id: &str,
        feature: Feature,
        cost: u64,
    ) -> Result<PlanDetails, LedgerError> {
        validate_user_id(user_id)?;
        if cost == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        self.with_user_lock(user_id, || {
            let (mut record, changed) = self.read_current(user_id)?;
            if record.plan == Plan::Unlimited {
                if changed {
                    self.persist(user_id, &record)?;
                }
                return Ok(record);
            }

            if !record.can_use(feature, cost) {
                let limit = record.limit(feature).unwrap_or(u64::MAX);
                debug!(
                    user_id,
                    feature = %feature,
                    cost,
                    limit,
                    used = record.usage(feature),
                    "quota exceeded"
                );
                return Err(LedgerError::QuotaExceeded {
                    feature,
                    limit,
                    current: record.usage(feature),
                    cost,
                });
            }

            record.add_usage(feature, cost);
            self.persist(user_id, &record)?;
            Ok(record)
        })
    }

    /// Switches the user to `plan` and starts a fresh usage window.
    pub fn change_plan(&self, user_id: &str, plan: Plan) -> Result<PlanDetails, LedgerError> {
        validate_user_id(user_id)?;
        self.with_user_lock(user_id, || {
            let record = PlanDetails::with_plan(plan, self.clock.today());
            self.persist(user_id, &record)?;
            info!(user_id, plan = %plan, "changed user plan");
            Ok(record)
        })
    }

    pub fn remaining(&self, record: &PlanDetails, feature: Feature) -> Remaining {
        record.normalized(self.clock.today()).remaining(feature)
    }

    /// Reads the stored record normalized to today. The flag is set when the
    /// result differs from what is stored.
    fn read_current(&self, user_id: &str) -> Result<(PlanDetails, bool), LedgerError> {
        let today = self.clock.today();
        let key = self.storage_key(user_id);

        let stored = match self.store.get(&key)? {
            Some(raw) => match serde_json::from_str::<PlanDetails>(&raw) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(user_id, error = %err, "discarding unreadable plan record");
                    None
                }
            },
            None => None,
        };

        match stored {
            Some(mut record) => {
                let changed = record.normalize(today);
                if changed {
                    debug!(user_id, today = %today, "rolled usage window over to today");
                }
                Ok((record, changed))
            }
            None => {
                info!(user_id, "initializing Free plan record");
                Ok((PlanDetails::new(today), true))
            }
        }
    }

    fn persist(&self, user_id: &str, record: &PlanDetails) -> Result<(), LedgerError> {
        let raw = serde_json::to_string(record)?;
        self.store.set(&self.storage_key(user_id), &raw)?;
        Ok(())
    }

    fn with_user_lock<T>(
        &self,
        user_id: &str,
        f: impl FnOnce() -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let lock = self
            .user_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f()
    }
}
