//! Shipping route queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ic_protocol::{Confidence, ShippingRoute};

/// Shipping route row returned from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RouteRow {
    pub id: i32,
    pub origin_country: String,
    pub destination_country: String,
    pub origin_port: String,
    pub destination_port: String,
    pub cost_minor: i64,
    pub currency: String,
    pub transit_days: i32,
    pub service_type: String,
    pub confidence: i16,
    pub source: String,
    pub last_verified: DateTime<Utc>,
}

impl From<RouteRow> for ShippingRoute {
    fn from(row: RouteRow) -> Self {
        Self {
            origin_country: row.origin_country,
            destination_country: row.destination_country,
            origin_port: row.origin_port,
            destination_port: row.destination_port,
            cost_minor: row.cost_minor,
            currency: row.currency,
            transit_days: u32::try_from(row.transit_days).unwrap_or(0),
            service_type: row.service_type,
            confidence: Confidence::new(row.confidence.into()),
            source: row.source,
            last_verified: row.last_verified,
        }
    }
}

/// Routes for a lane, best confidence first, cheaper first on ties.
pub async fn list_for_lane(
    pool: &PgPool,
    origin: &str,
    destination: &str,
) -> Result<Vec<RouteRow>, sqlx::Error> {
    sqlx::query_as::<_, RouteRow>(
        "SELECT * FROM shipping_routes
         WHERE origin_country = $1 AND destination_country = $2
         ORDER BY confidence DESC, cost_minor ASC",
    )
    .bind(origin)
    .bind(destination)
    .fetch_all(pool)
    .await
}
