use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::plan::{Feature, Plan, Remaining};

/// A user's plan and today's usage, as persisted under the plan key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetails {
    pub plan: Plan,
    #[serde(default)]
    pub is_premium: bool,
    pub daily_tokens_used: u64,
    pub daily_file_uploads_used: u64,
    pub last_usage_date: NaiveDate,
}

impl PlanDetails {
    pub fn new(today: NaiveDate) -> Self {
        Self::with_plan(Plan::Free, today)
    }

    pub fn with_plan(plan: Plan, today: NaiveDate) -> Self {
        Self {
            plan,
            is_premium: plan.is_premium(),
            daily_tokens_used: 0,
            daily_file_uploads_used: 0,
            last_usage_date: today,
        }
    }

    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.last_usage_date == today
    }

    /// Moves a stale record into today's window. Returns whether anything
    /// changed, including a repaired `is_premium` flag.
    pub fn normalize(&mut self, today: NaiveDate) -> bool {
        let mut changed = false;
        if !self.is_current(today) {
            self.daily_tokens_used = 0;
            self.daily_file_uploads_used = 0;
            self.last_usage_date = today;
            changed = true;
        }
        if self.is_premium != self.plan.is_premium() {
            self.is_premium = self.plan.is_premium();
            changed = true;
        }
        changed
    }

    pub fn normalized(&self, today: NaiveDate) -> Self {
        let mut copy = self.clone();
        copy.normalize(today);
        copy
    }

    pub fn usage(&self, feature: Feature) -> u64 {
        match feature {
            Feature::Expansions => self.daily_tokens_used,
            Feature::FileUploads => self.daily_file_uploads_used,
        }
    }

    pub fn limit(&self, feature: Feature) -> Option<u64> {
        self.plan.limits().for_feature(feature)
    }

    /// Whether `cost` more units fit under today's limit. Does not look at
    /// the date; callers normalize first.
    pub fn can_use(&self, feature: Feature, cost: u64) -> bool {
        match self.limit(feature) {
            None => true,
            Some(limit) => self
                .usage(feature)
                .checked_add(cost)
                .map_or(false, |total| total <= limit),
        }
    }

    pub fn remaining(&self, feature: Feature) -> Remaining {
        match self.limit(feature) {
            None => Remaining::Unlimited,
            Some(limit) => {
                let left = i128::from(limit) - i128::from(self.usage(feature));
                Remaining::Limited(left.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
            }
        }
    }

    pub fn add_usage(&mut self, feature: Feature, amount: u64) {
        let counter = match feature {
            Feature::Expansions => &mut self.daily_tokens_used,
            Feature::FileUploads => &mut self.daily_file_uploads_used,
        };
        *counter = counter.saturating_add(amount);
    }
}
