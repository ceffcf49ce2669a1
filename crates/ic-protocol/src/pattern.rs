use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::confidence::Confidence;
use crate::vehicle::{VehicleRecord, YearRange};

/// Curated or learned mapping from a normalized query to a vehicle identity.
///
/// `search_pattern` is unique and always lowercase with collapsed whitespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub id: Uuid,
    pub search_pattern: String,
    pub make: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_range: Option<YearRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_pattern: Option<String>,
    pub confidence: Confidence,
    pub source: String,
    pub auto_learned: bool,
    pub created_at: DateTime<Utc>,
}

impl Pattern {
    /// Canonical vehicle identity carried by this pattern.
    ///
    /// A single-year range is reported as an explicit `year` as well.
    pub fn to_vehicle_record(&self) -> VehicleRecord {
        VehicleRecord {
            make: self.make.clone(),
            model: self.model.clone(),
            year: self.year_range.filter(YearRange::is_single).map(|r| r.start),
            year_range: self.year_range,
            chassis_code: self.chassis_code.clone(),
            engine_code: self.engine_pattern.clone(),
            body_type: None,
            confidence: self.confidence,
            source: self.source.clone(),
            source_url: None,
            last_verified: self.created_at,
        }
    }

    /// Lowercased "make model chassis" haystack used for token matching.
    pub fn canonical_text(&self) -> String {
        let mut text = format!("{} {}", self.make, self.model);
        if let Some(chassis) = &self.chassis_code {
            text.push(' ');
            text.push_str(chassis);
        }
        text.to_lowercase()
    }
}

/// Canonical fields for a user-contributed pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSuggestion {
    pub make: String,
    pub model: String,
    #[serde(default)]
    pub chassis_code: Option<String>,
    #[serde(default)]
    pub year_start: Option<i32>,
    #[serde(default)]
    pub year_end: Option<i32>,
    #[serde(default)]
    pub engine_pattern: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(range: Option<YearRange>) -> Pattern {
        Pattern {
            id: Uuid::now_v7(),
            search_pattern: "fd rx7".into(),
            make: "Mazda".into(),
            model: "RX-7".into(),
            chassis_code: Some("FD3S".into()),
            year_range: range,
            engine_pattern: Some("13B-REW".into()),
            confidence: Confidence::new(88),
            source: "Curated".into(),
            auto_learned: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn single_year_range_sets_year() {
        let record = pattern(Some(YearRange::single(1994))).to_vehicle_record();
        assert_eq!(record.year, Some(1994));

        let record = pattern(Some(YearRange::new(1992, 2002).unwrap())).to_vehicle_record();
        assert_eq!(record.year, None);
        assert_eq!(record.confidence.value(), 88);
        assert_eq!(record.engine_code.as_deref(), Some("13B-REW"));
    }

    #[test]
    fn canonical_text_is_lowercase() {
        assert_eq!(pattern(None).canonical_text(), "mazda rx-7 fd3s");
    }
}
