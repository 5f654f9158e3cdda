pub mod clock;
pub mod error;
pub mod manager;
pub mod plan;
pub mod record;
pub mod user;

pub use clock::{DateProvider, FixedClock, SystemClock};
pub use error::LedgerError;
pub use manager::QuotaLedger;
pub use plan::{Feature, Plan, PlanLimits, Remaining};
pub use record::PlanDetails;
pub use user::{validate_user_id, UserValidationError};

pub const DEFAULT_PLAN_KEY_PREFIX: &str = "zexpander-user-plan-";
