//! Lookup history and review-flag inserts. Both tables are append-only.

use sqlx::PgPool;

use ic_protocol::{LookupHistoryEntry, ReviewFlag};

pub async fn insert_entry(pool: &PgPool, entry: &LookupHistoryEntry) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO lookup_history (id, query, lookup_type, result, confidence, user_id, session_id, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(entry.id)
    .bind(&entry.query)
    .bind(entry.lookup_type.as_str())
    .bind(&entry.result)
    .bind(i16::from(entry.confidence.value()))
    .bind(&entry.user_id)
    .bind(&entry.session_id)
    .bind(entry.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_flag(pool: &PgPool, flag: &ReviewFlag) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO review_flags (id, query, lookup_type, confidence, quality, suggestion, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(flag.id)
    .bind(&flag.query)
    .bind(flag.lookup_type.as_str())
    .bind(i16::from(flag.confidence.value()))
    .bind(flag.quality.as_str())
    .bind(&flag.suggestion)
    .bind(flag.created_at)
    .execute(pool)
    .await?;
    Ok(())
}
