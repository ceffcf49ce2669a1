//! Per-response source attribution ledger.

use chrono::{DateTime, Utc};

use ic_protocol::{Confidence, SourceEntry, VehicleRecord};

#[derive(Debug, Clone, Default)]
pub struct SourceLedger {
    entries: Vec<SourceEntry>,
}

impl SourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        data_point: impl Into<String>,
        source: impl Into<String>,
        confidence: Confidence,
        last_verified: DateTime<Utc>,
        url: Option<String>,
    ) -> &mut Self {
        self.entries.push(SourceEntry {
            data_point: data_point.into(),
            source: source.into(),
            confidence,
            last_verified,
            url,
        });
        self
    }

    /// One entry per populated vehicle field, all attributed to the record's source.
    pub fn record_vehicle(&mut self, vehicle: &VehicleRecord) -> &mut Self {
        let mut points = vec!["make", "model"];
        if vehicle.year.is_some() || vehicle.year_range.is_some() {
            points.push("year");
        }
        if vehicle.chassis_code.is_some() {
            points.push("chassis code");
        }
        if vehicle.engine_code.is_some() {
            points.push("engine code");
        }
        if vehicle.body_type.is_some() {
            points.push("body type");
        }
        for point in points {
            self.record(
                point,
                vehicle.source.clone(),
                vehicle.confidence,
                vehicle.last_verified,
                vehicle.source_url.clone(),
            );
        }
        self
    }

    /// Source of the first entry, or "none".
    pub fn primary_source(&self) -> String {
        self.entries
            .first()
            .map(|e| e.source.clone())
            .unwrap_or_else(|| "none".to_string())
    }

    pub fn into_entries(self) -> Vec<SourceEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_fields_become_entries() {
        let vehicle = VehicleRecord {
            make: "Toyota".into(),
            model: "Supra".into(),
            year: Some(1997),
            year_range: None,
            chassis_code: Some("JZA80".into()),
            engine_code: None,
            body_type: None,
            confidence: Confidence::new(93),
            source: "Curated".into(),
            source_url: None,
            last_verified: Utc::now(),
        };
        let mut ledger = SourceLedger::new();
        ledger.record_vehicle(&vehicle);
        assert_eq!(ledger.primary_source(), "Curated");

        let entries = ledger.into_entries();
        let points: Vec<&str> = entries.iter().map(|e| e.data_point.as_str()).collect();
        assert_eq!(points, vec!["make", "model", "year", "chassis code"]);
        assert!(entries.iter().all(|e| e.confidence.value() == 93));
    }

    #[test]
    fn empty_ledger_has_no_source() {
        let ledger = SourceLedger::new();
        assert_eq!(ledger.primary_source(), "none");
    }
}
