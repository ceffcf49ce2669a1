use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;

/// Import difficulty band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Band boundaries: `<25` low, `<50` medium, `<75` high, else critical.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..25 => Self::Low,
            25..50 => Self::Medium,
            50..75 => Self::High,
            _ => Self::Critical,
        }
    }
}

/// One weighted contributor to the risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    pub name: String,
    /// Signed points added to the score.
    pub impact: i32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRiskIndex {
    /// Always within `0..=100`.
    pub score: u8,
    pub risk_level: RiskLevel,
    pub factors: Vec<RiskFactor>,
    pub explanation: String,
}

/// A ranked strategic suggestion for importing a specific vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicRecommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub timing: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
    pub confidence: Confidence,
    /// Higher ranks first.
    pub priority: i32,
}
