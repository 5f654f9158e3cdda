use serde::{Deserialize, Serialize};

/// Which tool produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppMode {
    TextToolkit,
    DocumentSummary,
    ToneAnalysis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub original: String,
    pub expanded: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub model: String,
    #[serde(rename = "type")]
    pub mode: AppMode,
}

/// Caller-supplied part of a history entry; id and timestamp are assigned
/// on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHistoryItem {
    pub original: String,
    pub expanded: String,
    pub model: String,
    #[serde(rename = "type")]
    pub mode: AppMode,
}
