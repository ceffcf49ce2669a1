//! Database access layer for PostgreSQL.
//!
//! Each sub-module provides typed query functions over a `PgPool`.

pub mod history;
pub mod market;
pub mod patterns;
pub mod policies;
pub mod recommendations;
pub mod shipping;
pub mod specs;
pub mod watchlist;

use ic_protocol::YearRange;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Connect to PostgreSQL and run migrations.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    tracing::info!("running database migrations");
    sqlx::raw_sql(include_str!("../../migrations/001_vehicle_specs.sql"))
        .execute(&pool)
        .await?;
    sqlx::raw_sql(include_str!("../../migrations/002_vehicle_patterns.sql"))
        .execute(&pool)
        .await?;
    sqlx::raw_sql(include_str!("../../migrations/003_reference_data.sql"))
        .execute(&pool)
        .await?;
    sqlx::raw_sql(include_str!("../../migrations/004_audit.sql"))
        .execute(&pool)
        .await?;
    tracing::info!("migrations complete");

    Ok(pool)
}

/// Year-range columns → domain type. A lone bound is a single year.
pub(crate) fn year_range(start: Option<i32>, end: Option<i32>) -> Option<YearRange> {
    match (start, end) {
        (Some(s), Some(e)) => YearRange::new(s, e).ok(),
        (Some(y), None) | (None, Some(y)) => Some(YearRange::single(y)),
        (None, None) => None,
    }
}

/// Escape `%`, `_` and `\` for use inside a LIKE pattern.
pub(crate) fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
