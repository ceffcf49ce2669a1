use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A vehicle a user asked to be notified about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub id: Uuid,
    pub user_id: String,
    pub make: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis_code: Option<String>,
    /// Minor currency units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller input for adding a watchlist entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistRequest {
    pub user_id: String,
    pub make: String,
    pub model: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub chassis_code: Option<String>,
    #[serde(default)]
    pub max_price: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl WatchlistEntry {
    /// Duplicate key: one entry per user per (make, model, year).
    pub fn dedup_key(&self) -> (String, String, String, Option<i32>) {
        (
            self.user_id.clone(),
            self.make.to_lowercase(),
            self.model.to_lowercase(),
            self.year,
        )
    }
}
