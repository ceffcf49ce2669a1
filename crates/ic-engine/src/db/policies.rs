//! Compliance policy queries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use ic_protocol::{CompliancePolicy, Confidence};

/// Compliance policy row returned from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PolicyRow {
    pub id: i32,
    pub country: String,
    pub region: Option<String>,
    pub min_age_years: Option<i32>,
    pub max_age_years: Option<i32>,
    pub requirements: Vec<String>,
    pub costs: Json<BTreeMap<String, i64>>,
    pub special_notes: Vec<String>,
    pub confidence: i16,
    pub source: String,
    pub source_url: Option<String>,
    pub last_verified: DateTime<Utc>,
}

impl From<PolicyRow> for CompliancePolicy {
    fn from(row: PolicyRow) -> Self {
        Self {
            country: row.country,
            region: row.region,
            min_age_years: row.min_age_years.and_then(|v| u32::try_from(v).ok()),
            max_age_years: row.max_age_years.and_then(|v| u32::try_from(v).ok()),
            requirements: row.requirements,
            costs: row.costs.0,
            special_notes: row.special_notes,
            confidence: Confidence::new(row.confidence.into()),
            source: row.source,
            source_url: row.source_url,
            last_verified: row.last_verified,
        }
    }
}

/// Best policy for a country: a matching region first, then the
/// country-wide (region NULL) row.
pub async fn get_for(
    pool: &PgPool,
    country: &str,
    region: Option<&str>,
) -> Result<Option<PolicyRow>, sqlx::Error> {
    sqlx::query_as::<_, PolicyRow>(
        "SELECT * FROM compliance_policies
         WHERE country = $1
           AND (region IS NULL OR ($2::text IS NOT NULL AND lower(region) = lower($2)))
         ORDER BY (region IS NULL), confidence DESC
         LIMIT 1",
    )
    .bind(country)
    .bind(region)
    .fetch_optional(pool)
    .await
}
