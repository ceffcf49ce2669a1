use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;

/// A priced shipping lane between two ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRoute {
    pub origin_country: String,
    pub destination_country: String,
    pub origin_port: String,
    pub destination_port: String,
    /// Minor currency units.
    pub cost_minor: i64,
    pub currency: String,
    pub transit_days: u32,
    /// e.g. "roro", "container".
    pub service_type: String,
    pub confidence: Confidence,
    pub source: String,
    /// When the rate was last confirmed with the carrier.
    pub last_verified: DateTime<Utc>,
}

/// Best route plus the remaining candidates, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingEstimate {
    pub primary: ShippingRoute,
    pub alternatives: Vec<ShippingRoute>,
}
