//! Watchlist inserts.

use sqlx::PgPool;

use ic_protocol::WatchlistEntry;

/// Insert unless the user already watches this make/model/year.
pub async fn insert_if_absent(pool: &PgPool, entry: &WatchlistEntry) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO watchlist (id, user_id, make, model, year, chassis_code, max_price, notes, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         ON CONFLICT DO NOTHING",
    )
    .bind(entry.id)
    .bind(&entry.user_id)
    .bind(&entry.make)
    .bind(&entry.model)
    .bind(entry.year)
    .bind(&entry.chassis_code)
    .bind(entry.max_price)
    .bind(&entry.notes)
    .bind(entry.created_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}
