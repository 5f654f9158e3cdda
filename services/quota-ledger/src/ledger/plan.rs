use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// Subscription tier deciding a user's daily quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Unlimited,
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Free, Plan::Pro, Plan::Unlimited];

    pub fn is_premium(self) -> bool {
        self != Plan::Free
    }

    pub fn limits(self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                tokens: Some(5_000),
                file_uploads: Some(5),
            },
            Plan::Pro => PlanLimits {
                tokens: Some(100_000),
                file_uploads: Some(50),
            },
            Plan::Unlimited => PlanLimits {
                tokens: None,
                file_uploads: None,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Free => "Free",
            Plan::Pro => "Pro",
            Plan::Unlimited => "Unlimited",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            "unlimited" => Ok(Plan::Unlimited),
            _ => Err(format!("unknown plan: {s}")),
        }
    }
}

/// A metered capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// Text-processing operations, charged by caller-supplied cost.
    #[serde(rename = "expansions")]
    Expansions,
    #[serde(rename = "fileUploads")]
    FileUploads,
}

impl Feature {
    pub fn as_str(self) -> &'static str {
        match self {
            Feature::Expansions => "expansions",
            Feature::FileUploads => "fileUploads",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expansions" => Ok(Feature::Expansions),
            "fileUploads" | "file_uploads" | "file-uploads" => Ok(Feature::FileUploads),
            _ => Err(format!("unknown feature: {s}")),
        }
    }
}

/// Daily limits for one plan. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub tokens: Option<u64>,
    pub file_uploads: Option<u64>,
}

impl PlanLimits {
    pub fn for_feature(&self, feature: Feature) -> Option<u64> {
        match feature {
            Feature::Expansions => self.tokens,
            Feature::FileUploads => self.file_uploads,
        }
    }
}

/// How much of a feature's daily quota is left.
///
/// `Limited` is not clamped: usage pushed past the limit by an unchecked
/// `record_usage` shows up as a negative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Limited(i64),
    Unlimited,
}

impl Remaining {
    pub fn for_display(self) -> Option<u64> {
        match self {
            Remaining::Limited(value) => Some(value.max(0) as u64),
            Remaining::Unlimited => None,
        }
    }
}

impl Serialize for Remaining {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Remaining::Limited(value) => serializer.serialize_i64(*value),
            Remaining::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}
