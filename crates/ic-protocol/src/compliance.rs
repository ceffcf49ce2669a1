use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;

/// Import rules for a destination country, optionally narrowed to a region.
///
/// `region == None` applies to every region of the country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompliancePolicy {
    /// Lowercased country key, e.g. "australia".
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_age_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age_years: Option<u32>,
    #[serde(default)]
    pub requirements: Vec<String>,
    /// Label → amount in minor currency units.
    #[serde(default)]
    pub costs: BTreeMap<String, i64>,
    #[serde(default)]
    pub special_notes: Vec<String>,
    pub confidence: Confidence,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub last_verified: DateTime<Utc>,
}

impl CompliancePolicy {
    /// Sum of all cost lines, saturating at `i64` bounds.
    pub fn total_cost(&self) -> i64 {
        self.costs.values().copied().fold(0i64, i64::saturating_add)
    }

    /// Whether a vehicle of `age` years satisfies the age window.
    pub fn admits_age(&self, age: u32) -> bool {
        let old_enough = self.min_age_years.is_none_or(|min| age >= min);
        let young_enough = self.max_age_years.is_none_or(|max| age <= max);
        old_enough && young_enough
    }

    /// Years left until `age` reaches the minimum; zero when already there.
    pub fn years_until_eligible(&self, age: u32) -> u32 {
        self.min_age_years
            .map(|min| min.saturating_sub(age))
            .unwrap_or(0)
    }
}

/// Outcome of a compliance check for a given vehicle year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    pub policy: CompliancePolicy,
    pub vehicle_year: Option<i32>,
    pub vehicle_age: Option<u32>,
    /// `None` when no year was supplied.
    pub is_eligible: Option<bool>,
    pub years_until_eligible: Option<u32>,
    pub estimated_total_cost: i64,
}
