use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed listing or auction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSample {
    pub make: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Minor currency units.
    pub price_minor: i64,
    pub currency: String,
    pub listing_date: DateTime<Utc>,
    pub source_site: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Aggregate over the samples for a (make, model[, year]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub make: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub sample_count: usize,
    pub average_price: i64,
    pub min_price: i64,
    pub max_price: i64,
    pub currency: String,
    pub recent_samples: Vec<MarketSample>,
}
