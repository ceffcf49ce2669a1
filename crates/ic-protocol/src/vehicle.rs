use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::confidence::Confidence;

/// Inclusive model-year span, e.g. a chassis generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid year range {start}-{end}")]
pub struct YearRangeError {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self, YearRangeError> {
        if start > end {
            return Err(YearRangeError { start, end });
        }
        Ok(Self { start, end })
    }

    /// A single-year span.
    pub fn single(year: i32) -> Self {
        Self {
            start: year,
            end: year,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A resolved vehicle identity.
///
/// Records are never mutated after they leave a store or resolver; each
/// resolution builds a fresh instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub make: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_range: Option<YearRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_type: Option<String>,
    pub confidence: Confidence,
    /// Human-readable provenance, e.g. "NHTSA vPIC" or "Heuristic Pattern Engine".
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub last_verified: DateTime<Utc>,
}

impl VehicleRecord {
    /// Best single year for age calculations: the explicit year, else the
    /// first year of the range.
    pub fn reference_year(&self) -> Option<i32> {
        self.year.or(self.year_range.map(|r| r.start))
    }

    /// "Nissan Skyline GT-R (BNR34, 1999-2002)".
    pub fn display_name(&self) -> String {
        let mut name = format!("{} {}", self.make, self.model);
        let mut detail = Vec::new();
        if let Some(chassis) = &self.chassis_code {
            detail.push(chassis.clone());
        }
        match (self.year, self.year_range) {
            (Some(y), _) => detail.push(y.to_string()),
            (None, Some(r)) => detail.push(r.to_string()),
            (None, None) => {}
        }
        if !detail.is_empty() {
            name.push_str(&format!(" ({})", detail.join(", ")));
        }
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VehicleRecord {
        VehicleRecord {
            make: "Nissan".into(),
            model: "Skyline GT-R".into(),
            year: None,
            year_range: Some(YearRange::new(1999, 2002).unwrap()),
            chassis_code: Some("BNR34".into()),
            engine_code: Some("RB26DETT".into()),
            body_type: Some("Coupe".into()),
            confidence: Confidence::new(90),
            source: "Heuristic Pattern Engine".into(),
            source_url: None,
            last_verified: Utc::now(),
        }
    }

    #[test]
    fn year_range_rejects_inverted() {
        assert!(YearRange::new(2002, 1999).is_err());
        assert!(YearRange::new(1999, 1999).unwrap().is_single());
    }

    #[test]
    fn reference_year_prefers_explicit_year() {
        let mut record = sample();
        assert_eq!(record.reference_year(), Some(1999));
        record.year = Some(2001);
        assert_eq!(record.reference_year(), Some(2001));
    }

    #[test]
    fn display_name_includes_chassis_and_years() {
        assert_eq!(sample().display_name(), "Nissan Skyline GT-R (BNR34, 1999-2002)");
    }

    #[test]
    fn serializes_camel_case_without_empty_fields() {
        let mut record = sample();
        record.engine_code = None;
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["chassisCode"], "BNR34");
        assert_eq!(json["yearRange"]["start"], 1999);
        assert!(json.get("engineCode").is_none());
        assert_eq!(json["confidence"], 90);
    }
}
