//! Pattern and fallback-keyword queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use ic_protocol::{Confidence, Pattern};

use super::{escape_like, year_range};

// Stored columns are never used as LIKE patterns; `strpos` keeps their
// `%` and `_` literal. Only escaped caller input goes on the right of LIKE.
const CANDIDATES_SQL: &str = "SELECT * FROM vehicle_patterns
     WHERE strpos($1, search_pattern) > 0
        OR search_pattern LIKE '%' || $2 || '%'
        OR strpos($3, search_pattern) > 0
        OR search_pattern LIKE '%' || $4 || '%'
        OR (cardinality($5::text[]) > 0 AND NOT EXISTS (
                SELECT 1 FROM unnest($5::text[]) AS t(token)
                WHERE lower(make || ' ' || model || ' ' || coalesce(chassis_code, ''))
                      NOT LIKE '%' || t.token || '%'))
     ORDER BY confidence DESC, length(search_pattern) DESC
     LIMIT $6";

const KEYWORD_SUGGESTIONS_SQL: &str = "SELECT suggestion FROM (
         SELECT DISTINCT ON (suggestion) suggestion, id FROM fallback_keywords
         WHERE strpos($1, input_variation) > 0
            OR EXISTS (
                SELECT 1 FROM unnest($2::text[]) AS t(token)
                WHERE input_variation LIKE '%' || t.token || '%'
                   OR normalized_model LIKE '%' || t.token || '%')
         ORDER BY suggestion, id
     ) s
     ORDER BY id
     LIMIT $3";

/// Pattern row returned from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PatternRow {
    pub id: Uuid,
    pub search_pattern: String,
    pub make: String,
    pub model: String,
    pub chassis_code: Option<String>,
    pub year_start: Option<i32>,
    pub year_end: Option<i32>,
    pub engine_pattern: Option<String>,
    pub confidence: i16,
    pub source: String,
    pub auto_learned: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PatternRow> for Pattern {
    fn from(row: PatternRow) -> Self {
        Self {
            id: row.id,
            search_pattern: row.search_pattern,
            make: row.make,
            model: row.model,
            chassis_code: row.chassis_code,
            year_range: year_range(row.year_start, row.year_end),
            engine_pattern: row.engine_pattern,
            confidence: Confidence::new(row.confidence.into()),
            source: row.source,
            auto_learned: row.auto_learned,
            created_at: row.created_at,
        }
    }
}

/// Get a pattern by exact normalized key.
pub async fn get_by_key(pool: &PgPool, key: &str) -> Result<Option<PatternRow>, sqlx::Error> {
    sqlx::query_as::<_, PatternRow>("SELECT * FROM vehicle_patterns WHERE search_pattern = $1")
        .bind(key)
        .fetch_optional(pool)
        .await
}

/// Candidate patterns for a partial match: containment in either direction
/// (as typed and word-reversed), or every token found in make/model/chassis.
pub async fn list_candidates(
    pool: &PgPool,
    normalized: &str,
    reversed: &str,
    tokens: &[String],
    limit: i64,
) -> Result<Vec<PatternRow>, sqlx::Error> {
    let escaped_tokens: Vec<String> = tokens.iter().map(|t| escape_like(t)).collect();
    sqlx::query_as::<_, PatternRow>(CANDIDATES_SQL)
    .bind(normalized)
    .bind(escape_like(normalized))
    .bind(reversed)
    .bind(escape_like(reversed))
    .bind(&escaped_tokens)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Insert a pattern unless its key already exists. Returns whether a row
/// was written.
pub async fn insert_if_absent(pool: &PgPool, pattern: &Pattern) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO vehicle_patterns (id, search_pattern, make, model, chassis_code, year_start, year_end, engine_pattern, confidence, source, auto_learned, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         ON CONFLICT (search_pattern) DO NOTHING",
    )
    .bind(pattern.id)
    .bind(&pattern.search_pattern)
    .bind(&pattern.make)
    .bind(&pattern.model)
    .bind(&pattern.chassis_code)
    .bind(pattern.year_range.map(|r| r.start))
    .bind(pattern.year_range.map(|r| r.end))
    .bind(&pattern.engine_pattern)
    .bind(i16::from(pattern.confidence.value()))
    .bind(&pattern.source)
    .bind(pattern.auto_learned)
    .bind(pattern.created_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Fallback suggestions loosely related to a query.
pub async fn list_keyword_suggestions(
    pool: &PgPool,
    normalized: &str,
    tokens: &[String],
    limit: i64,
) -> Result<Vec<String>, sqlx::Error> {
    let escaped_tokens: Vec<String> = tokens
        .iter()
        .filter(|t| t.len() >= 3)
        .map(|t| escape_like(t))
        .collect();
    sqlx::query_scalar::<_, String>(KEYWORD_SUGGESTIONS_SQL)
    .bind(normalized)
    .bind(&escaped_tokens)
    .bind(limit)
    .fetch_all(pool)
    .await
}
