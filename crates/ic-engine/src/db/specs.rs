//! Vehicle specification queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ic_protocol::{Confidence, VehicleRecord};

use super::{escape_like, year_range};

/// Vehicle spec row returned from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpecRow {
    pub vin: String,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub year_start: Option<i32>,
    pub year_end: Option<i32>,
    pub chassis_code: Option<String>,
    pub engine_code: Option<String>,
    pub body_type: Option<String>,
    pub confidence: i16,
    pub source: String,
    pub source_url: Option<String>,
    pub last_verified: DateTime<Utc>,
}

impl From<SpecRow> for VehicleRecord {
    fn from(row: SpecRow) -> Self {
        Self {
            make: row.make,
            model: row.model,
            year: row.year,
            year_range: year_range(row.year_start, row.year_end),
            chassis_code: row.chassis_code,
            engine_code: row.engine_code,
            body_type: row.body_type,
            confidence: Confidence::new(row.confidence.into()),
            source: row.source,
            source_url: row.source_url,
            last_verified: row.last_verified,
        }
    }
}

/// Get a spec by exact VIN.
pub async fn get_by_vin(pool: &PgPool, vin: &str) -> Result<Option<SpecRow>, sqlx::Error> {
    sqlx::query_as::<_, SpecRow>("SELECT * FROM vehicle_specs WHERE vin = $1")
        .bind(vin)
        .fetch_optional(pool)
        .await
}

/// Specs whose VIN starts with `prefix`, highest confidence first.
pub async fn list_by_prefix(
    pool: &PgPool,
    prefix: &str,
    limit: i64,
) -> Result<Vec<SpecRow>, sqlx::Error> {
    sqlx::query_as::<_, SpecRow>(
        "SELECT * FROM vehicle_specs
         WHERE vin LIKE $1 || '%'
         ORDER BY confidence DESC, last_verified DESC
         LIMIT $2",
    )
    .bind(escape_like(prefix))
    .bind(limit)
    .fetch_all(pool)
    .await
}
