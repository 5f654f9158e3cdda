pub mod error;
pub mod item;
pub mod store;

pub use error::HistoryError;
pub use item::{AppMode, HistoryItem, NewHistoryItem};
pub use store::HistoryStore;

pub const DEFAULT_HISTORY_KEY_PREFIX: &str = "zexpander-history-";
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
