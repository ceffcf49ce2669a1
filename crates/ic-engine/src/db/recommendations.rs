//! Strategic recommendation rule queries.

use sqlx::PgPool;

use ic_protocol::Confidence;

use crate::store::RecommendationRule;

/// Recommendation row returned from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecommendationRow {
    pub id: i32,
    pub make: Option<String>,
    pub model_pattern: Option<String>,
    pub destination: Option<String>,
    pub kind: String,
    pub title: String,
    pub description: String,
    pub timing: String,
    pub alternatives: Vec<String>,
    pub confidence: i16,
    pub priority: i32,
}

impl From<RecommendationRow> for RecommendationRule {
    fn from(row: RecommendationRow) -> Self {
        Self {
            make: row.make,
            model_pattern: row.model_pattern,
            destination: row.destination,
            kind: row.kind,
            title: row.title,
            description: row.description,
            timing: row.timing,
            alternatives: row.alternatives,
            confidence: Confidence::new(row.confidence.into()),
            priority: row.priority,
        }
    }
}

/// Rules matching a make/model for a destination or for any destination.
pub async fn list_applicable(
    pool: &PgPool,
    make: &str,
    model: &str,
    destination: &str,
) -> Result<Vec<RecommendationRow>, sqlx::Error> {
    sqlx::query_as::<_, RecommendationRow>(
        "SELECT * FROM import_recommendations
         WHERE (make IS NULL OR lower(make) = lower($1))
           AND (model_pattern IS NULL OR strpos(lower($2), lower(model_pattern)) > 0)
           AND (destination IS NULL OR lower(destination) = lower($3))
         ORDER BY priority DESC, confidence DESC",
    )
    .bind(make)
    .bind(model)
    .bind(destination)
    .fetch_all(pool)
    .await
}
