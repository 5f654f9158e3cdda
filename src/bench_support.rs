use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;
use zexpander_quota_ledger::{
    Feature, FixedClock, HistoryStore, MemoryStore, Plan, QuotaLedger, SqliteStore,
};

pub const BENCH_USER: &str = "bench-user";

/// A ledger over either backend with a pinned clock, pre-seeded with one
/// Pro user who has spent part of the day's budget.
pub struct LedgerBenchFixture {
    pub ledger: QuotaLedger,
    pub history: HistoryStore,
    pub clock: Arc<FixedClock>,
    pub temp_dir: Option<TempDir>,
}

impl LedgerBenchFixture {
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::at_date(bench_date()));
        Self::seeded(
            QuotaLedger::new(store.clone(), clock.clone()),
            HistoryStore::new(store, clock.clone()),
            clock,
            None,
        )
    }

    pub fn sqlite() -> Self {
        let temp_dir = TempDir::new().expect("tempdir");
        let store = Arc::new(SqliteStore::new(temp_dir.path()).expect("open sqlite store"));
        let clock = Arc::new(FixedClock::at_date(bench_date()));
        Self::seeded(
            QuotaLedger::new(store.clone(), clock.clone()),
            HistoryStore::new(store, clock.clone()),
            clock,
            Some(temp_dir),
        )
    }

    fn seeded(
        ledger: QuotaLedger,
        history: HistoryStore,
        clock: Arc<FixedClock>,
        temp_dir: Option<TempDir>,
    ) -> Self {
        ledger
            .change_plan(BENCH_USER, Plan::Pro)
            .expect("seed bench plan");
        ledger
            .record_usage(BENCH_USER, Feature::Expansions, 1_000)
            .expect("seed bench usage");
        Self {
            ledger,
            history,
            clock,
            temp_dir,
        }
    }
}

fn bench_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid bench date")
}
