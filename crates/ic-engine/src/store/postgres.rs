//! PostgreSQL store over the `db` query modules.

use async_trait::async_trait;
use sqlx::PgPool;

use ic_protocol::{
    CompliancePolicy, LookupHistoryEntry, MarketSample, Pattern, ReviewFlag, ShippingRoute,
    VehicleRecord, WatchlistEntry,
};

use super::{PatternQuery, RecommendationRule, Store};
use crate::db;
use crate::error::EngineResult;

/// Upper bound on market samples pulled for one aggregate.
const MARKET_SAMPLE_LIMIT: i64 = 500;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, run migrations, and wrap the pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> EngineResult<Self> {
        let pool = db::connect(database_url, max_connections).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl Store for PgStore {
    async fn spec_by_vin(&self, vin: &str) -> EngineResult<Option<VehicleRecord>> {
        let row = db::specs::get_by_vin(&self.pool, &vin.to_uppercase()).await?;
        Ok(row.map(Into::into))
    }

    async fn specs_by_vin_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> EngineResult<Vec<VehicleRecord>> {
        let rows =
            db::specs::list_by_prefix(&self.pool, &prefix.to_uppercase(), to_i64(limit)).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn pattern_by_key(&self, key: &str) -> EngineResult<Option<Pattern>> {
        let row = db::patterns::get_by_key(&self.pool, key).await?;
        Ok(row.map(Into::into))
    }

    async fn pattern_candidates(
        &self,
        query: &PatternQuery,
        limit: usize,
    ) -> EngineResult<Vec<Pattern>> {
        let rows = db::patterns::list_candidates(
            &self.pool,
            &query.normalized,
            &query.reversed,
            &query.tokens,
            to_i64(limit),
        )
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_pattern(&self, pattern: &Pattern) -> EngineResult<bool> {
        Ok(db::patterns::insert_if_absent(&self.pool, pattern).await?)
    }

    async fn compliance_policy(
        &self,
        country: &str,
        region: Option<&str>,
    ) -> EngineResult<Option<CompliancePolicy>> {
        let row = db::policies::get_for(&self.pool, country, region).await?;
        Ok(row.map(Into::into))
    }

    async fn shipping_routes(
        &self,
        origin: &str,
        destination: &str,
    ) -> EngineResult<Vec<ShippingRoute>> {
        let rows = db::shipping::list_for_lane(&self.pool, origin, destination).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn market_samples(
        &self,
        make: &str,
        model: &str,
        year: Option<i32>,
    ) -> EngineResult<Vec<MarketSample>> {
        let rows =
            db::market::list_for(&self.pool, make, model, year, MARKET_SAMPLE_LIMIT).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn fallback_keywords(
        &self,
        query: &PatternQuery,
        limit: usize,
    ) -> EngineResult<Vec<String>> {
        Ok(db::patterns::list_keyword_suggestions(
            &self.pool,
            &query.normalized,
            &query.tokens,
            to_i64(limit),
        )
        .await?)
    }

    async fn recommendation_rules(
        &self,
        make: &str,
        model: &str,
        destination: &str,
    ) -> EngineResult<Vec<RecommendationRule>> {
        let rows =
            db::recommendations::list_applicable(&self.pool, make, model, destination).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn append_history(&self, entry: &LookupHistoryEntry) -> EngineResult<()> {
        Ok(db::history::insert_entry(&self.pool, entry).await?)
    }

    async fn append_review_flag(&self, flag: &ReviewFlag) -> EngineResult<()> {
        Ok(db::history::insert_flag(&self.pool, flag).await?)
    }

    async fn add_watchlist(&self, entry: &WatchlistEntry) -> EngineResult<bool> {
        Ok(db::watchlist::insert_if_absent(&self.pool, entry).await?)
    }
}
