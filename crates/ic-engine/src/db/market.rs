//! Market sample queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ic_protocol::MarketSample;

/// Market sample row returned from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SampleRow {
    pub id: i32,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub price_minor: i64,
    pub currency: String,
    pub listing_date: DateTime<Utc>,
    pub source_site: String,
    pub url: Option<String>,
}

impl From<SampleRow> for MarketSample {
    fn from(row: SampleRow) -> Self {
        Self {
            make: row.make,
            model: row.model,
            year: row.year,
            price_minor: row.price_minor,
            currency: row.currency,
            listing_date: row.listing_date,
            source_site: row.source_site,
            url: row.url,
        }
    }
}

/// Samples for a make/model (case-insensitive), optionally one year, newest first.
pub async fn list_for(
    pool: &PgPool,
    make: &str,
    model: &str,
    year: Option<i32>,
    limit: i64,
) -> Result<Vec<SampleRow>, sqlx::Error> {
    sqlx::query_as::<_, SampleRow>(
        "SELECT * FROM market_samples
         WHERE lower(make) = lower($1) AND lower(model) = lower($2)
           AND ($3::int IS NULL OR year = $3)
         ORDER BY listing_date DESC
         LIMIT $4",
    )
    .bind(make)
    .bind(model)
    .bind(year)
    .bind(limit)
    .fetch_all(pool)
    .await
}
