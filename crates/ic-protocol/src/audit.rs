use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::confidence::Confidence;

/// Which public operation produced a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupType {
    Vin,
    ChassisCode,
    Query,
    Compliance,
    Shipping,
    Market,
}

impl LookupType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vin => "vin",
            Self::ChassisCode => "chassis_code",
            Self::Query => "query",
            Self::Compliance => "compliance",
            Self::Shipping => "shipping",
            Self::Market => "market",
        }
    }
}

impl std::fmt::Display for LookupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only record of one engine call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupHistoryEntry {
    pub id: Uuid,
    pub query: String,
    pub lookup_type: LookupType,
    /// Serialized response envelope.
    pub result: serde_json::Value,
    pub confidence: Confidence,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Coarse quality bucket attached to a review flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLabel {
    /// No stage produced data.
    Failed,
    /// Data was produced below the review threshold.
    LowConfidence,
}

impl QualityLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Failed => "failed",
            Self::LowConfidence => "low_confidence",
        }
    }
}

/// A lookup queued for human review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewFlag {
    pub id: Uuid,
    pub query: String,
    pub lookup_type: LookupType,
    pub confidence: Confidence,
    pub quality: QualityLabel,
    pub suggestion: String,
    pub created_at: DateTime<Utc>,
}
