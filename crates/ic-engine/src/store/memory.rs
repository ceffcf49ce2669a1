//! In-memory store for tests and development.
//!
//! Mirrors the PostgreSQL semantics (unique search patterns, do-nothing
//! upserts, region fallback) and supports fault injection so callers can
//! exercise the store-failure paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use ic_protocol::{
    CompliancePolicy, LookupHistoryEntry, MarketSample, Pattern, ReviewFlag, ShippingRoute,
    VehicleRecord, WatchlistEntry,
};

use super::{FallbackKeyword, PatternQuery, RecommendationRule, Store};
use crate::error::{EngineError, EngineResult};

#[derive(Default)]
pub struct MemoryStore {
    specs: RwLock<HashMap<String, VehicleRecord>>,
    patterns: RwLock<HashMap<String, Pattern>>,
    policies: RwLock<Vec<CompliancePolicy>>,
    routes: RwLock<Vec<ShippingRoute>>,
    samples: RwLock<Vec<MarketSample>>,
    keywords: RwLock<Vec<FallbackKeyword>>,
    rules: RwLock<Vec<RecommendationRule>>,
    history: RwLock<Vec<LookupHistoryEntry>>,
    flags: RwLock<Vec<ReviewFlag>>,
    watchlist: RwLock<Vec<WatchlistEntry>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_audit: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Seeding ─────────────────────────────────────────────────

    /// Add a vehicle specification keyed by its VIN.
    pub async fn insert_spec(&self, vin: &str, record: VehicleRecord) {
        self.specs.write().await.insert(vin.to_uppercase(), record);
    }

    /// Add or replace a curated pattern.
    pub async fn insert_pattern(&self, pattern: Pattern) {
        self.patterns
            .write()
            .await
            .insert(pattern.search_pattern.clone(), pattern);
    }

    pub async fn insert_policy(&self, policy: CompliancePolicy) {
        self.policies.write().await.push(policy);
    }

    pub async fn insert_route(&self, route: ShippingRoute) {
        self.routes.write().await.push(route);
    }

    pub async fn insert_sample(&self, sample: MarketSample) {
        self.samples.write().await.push(sample);
    }

    pub async fn insert_keyword(&self, keyword: FallbackKeyword) {
        self.keywords.write().await.push(keyword);
    }

    pub async fn insert_rule(&self, rule: RecommendationRule) {
        self.rules.write().await.push(rule);
    }

    // ── Fault injection ─────────────────────────────────────────

    /// Make every read fail with a store error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make pattern and watchlist writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make history and review-flag appends fail.
    pub fn set_fail_audit(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    // ── Inspection ──────────────────────────────────────────────

    pub async fn patterns(&self) -> Vec<Pattern> {
        self.patterns.read().await.values().cloned().collect()
    }

    pub async fn pattern_count(&self, key: &str) -> usize {
        self.patterns
            .read()
            .await
            .values()
            .filter(|p| p.search_pattern == key)
            .count()
    }

    pub async fn history(&self) -> Vec<LookupHistoryEntry> {
        self.history.read().await.clone()
    }

    pub async fn review_flags(&self) -> Vec<ReviewFlag> {
        self.flags.read().await.clone()
    }

    pub async fn watchlist(&self) -> Vec<WatchlistEntry> {
        self.watchlist.read().await.clone()
    }

    fn check_read(&self) -> EngineResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(EngineError::Store("injected read failure".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> EngineResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(EngineError::Store("injected write failure".into()));
        }
        Ok(())
    }

    fn check_audit(&self) -> EngineResult<()> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(EngineError::Store("injected audit failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn spec_by_vin(&self, vin: &str) -> EngineResult<Option<VehicleRecord>> {
        self.check_read()?;
        Ok(self.specs.read().await.get(&vin.to_uppercase()).cloned())
    }

    async fn specs_by_vin_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> EngineResult<Vec<VehicleRecord>> {
        self.check_read()?;
        let prefix = prefix.to_uppercase();
        let specs = self.specs.read().await;
        let mut hits: Vec<VehicleRecord> = specs
            .iter()
            .filter(|(vin, _)| vin.starts_with(&prefix))
            .map(|(_, record)| record.clone())
            .collect();
        hits.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn pattern_by_key(&self, key: &str) -> EngineResult<Option<Pattern>> {
        self.check_read()?;
        Ok(self.patterns.read().await.get(key).cloned())
    }

    async fn pattern_candidates(
        &self,
        query: &PatternQuery,
        limit: usize,
    ) -> EngineResult<Vec<Pattern>> {
        self.check_read()?;
        let patterns = self.patterns.read().await;
        let mut hits: Vec<Pattern> = patterns
            .values()
            .filter(|p| query.match_kind(p).is_some())
            .cloned()
            .collect();
        hits.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then_with(|| b.search_pattern.len().cmp(&a.search_pattern.len()))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn upsert_pattern(&self, pattern: &Pattern) -> EngineResult<bool> {
        self.check_write()?;
        let mut patterns = self.patterns.write().await;
        if patterns.contains_key(&pattern.search_pattern) {
            return Ok(false);
        }
        patterns.insert(pattern.search_pattern.clone(), pattern.clone());
        Ok(true)
    }

    async fn compliance_policy(
        &self,
        country: &str,
        region: Option<&str>,
    ) -> EngineResult<Option<CompliancePolicy>> {
        self.check_read()?;
        let policies = self.policies.read().await;
        let in_country: Vec<&CompliancePolicy> =
            policies.iter().filter(|p| p.country == country).collect();

        if let Some(region) = region
            && let Some(p) = in_country
                .iter()
                .filter(|p| {
                    p.region
                        .as_deref()
                        .is_some_and(|r| r.eq_ignore_ascii_case(region))
                })
                .max_by_key(|p| p.confidence)
        {
            return Ok(Some((*p).clone()));
        }

        Ok(in_country
            .iter()
            .filter(|p| p.region.is_none())
            .max_by_key(|p| p.confidence)
            .map(|p| (*p).clone()))
    }

    async fn shipping_routes(
        &self,
        origin: &str,
        destination: &str,
    ) -> EngineResult<Vec<ShippingRoute>> {
        self.check_read()?;
        let mut routes: Vec<ShippingRoute> = self
            .routes
            .read()
            .await
            .iter()
            .filter(|r| r.origin_country == origin && r.destination_country == destination)
            .cloned()
            .collect();
        routes.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then_with(|| a.cost_minor.cmp(&b.cost_minor))
        });
        Ok(routes)
    }

    async fn market_samples(
        &self,
        make: &str,
        model: &str,
        year: Option<i32>,
    ) -> EngineResult<Vec<MarketSample>> {
        self.check_read()?;
        let mut samples: Vec<MarketSample> = self
            .samples
            .read()
            .await
            .iter()
            .filter(|s| s.make.eq_ignore_ascii_case(make) && s.model.eq_ignore_ascii_case(model))
            .filter(|s| year.is_none() || s.year == year)
            .cloned()
            .collect();
        samples.sort_by(|a, b| b.listing_date.cmp(&a.listing_date));
        Ok(samples)
    }

    async fn fallback_keywords(
        &self,
        query: &PatternQuery,
        limit: usize,
    ) -> EngineResult<Vec<String>> {
        self.check_read()?;
        let keywords = self.keywords.read().await;
        let mut out: Vec<String> = Vec::new();
        for kw in keywords.iter().filter(|kw| kw.relates_to(query)) {
            if !out.contains(&kw.suggestion) {
                out.push(kw.suggestion.clone());
            }
            if out.len() >= limit {
                break;
            }
        }
        Ok(out)
    }

    async fn recommendation_rules(
        &self,
        make: &str,
        model: &str,
        destination: &str,
    ) -> EngineResult<Vec<RecommendationRule>> {
        self.check_read()?;
        Ok(self
            .rules
            .read()
            .await
            .iter()
            .filter(|r| r.applies_to(make, model, destination))
            .cloned()
            .collect())
    }

    async fn append_history(&self, entry: &LookupHistoryEntry) -> EngineResult<()> {
        self.check_audit()?;
        self.history.write().await.push(entry.clone());
        Ok(())
    }

    async fn append_review_flag(&self, flag: &ReviewFlag) -> EngineResult<()> {
        self.check_audit()?;
        self.flags.write().await.push(flag.clone());
        Ok(())
    }

    async fn add_watchlist(&self, entry: &WatchlistEntry) -> EngineResult<bool> {
        self.check_write()?;
        let mut watchlist = self.watchlist.write().await;
        let key = entry.dedup_key();
        if watchlist.iter().any(|e| e.dedup_key() == key) {
            return Ok(false);
        }
        watchlist.push(entry.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ic_protocol::Confidence;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use uuid::Uuid;

    fn record(model: &str, confidence: i64) -> VehicleRecord {
        VehicleRecord {
            make: "Nissan".into(),
            model: model.into(),
            year: Some(2015),
            year_range: None,
            chassis_code: None,
            engine_code: None,
            body_type: None,
            confidence: Confidence::new(confidence),
            source: "NHTSA vPIC".into(),
            source_url: None,
            last_verified: Utc::now(),
        }
    }

    fn pattern(key: &str) -> Pattern {
        Pattern {
            id: Uuid::now_v7(),
            search_pattern: key.into(),
            make: "Nissan".into(),
            model: "Skyline GT-R".into(),
            chassis_code: Some("BNR34".into()),
            year_range: None,
            engine_pattern: None,
            confidence: Confidence::new(90),
            source: "Heuristic Pattern Engine".into(),
            auto_learned: true,
            created_at: Utc::now(),
        }
    }

    fn policy(region: Option<&str>, min_age: u32) -> CompliancePolicy {
        CompliancePolicy {
            country: "canada".into(),
            region: region.map(String::from),
            min_age_years: Some(min_age),
            max_age_years: None,
            requirements: vec![],
            costs: BTreeMap::new(),
            special_notes: vec![],
            confidence: Confidence::new(85),
            source: "Transport Canada".into(),
            source_url: None,
            last_verified: Utc::now(),
        }
    }

    #[tokio::test]
    async fn prefix_search_orders_by_confidence() {
        let store = MemoryStore::new();
        store.insert_spec("JN1CV6AP4FM123456", record("Q50", 70)).await;
        store.insert_spec("JN1CV6AP4FM999999", record("Q50 Red Sport", 92)).await;
        store.insert_spec("JT2JA82J0R0012345", record("Supra", 99)).await;

        let hits = store.specs_by_vin_prefix("JN1CV6AP4FM", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].model, "Q50 Red Sport");
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let store = MemoryStore::new();
        assert!(store.upsert_pattern(&pattern("r34 gtr")).await.unwrap());
        assert!(!store.upsert_pattern(&pattern("r34 gtr")).await.unwrap());
        assert_eq!(store.pattern_count("r34 gtr").await, 1);
    }

    #[tokio::test]
    async fn concurrent_upserts_leave_one_row() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.upsert_pattern(&pattern("r34 gtr")).await.unwrap()
            }));
        }
        let mut inserted = 0;
        for h in handles {
            if h.await.unwrap() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(store.pattern_count("r34 gtr").await, 1);
    }

    #[tokio::test]
    async fn region_policy_wins_over_country_wide() {
        let store = MemoryStore::new();
        store.insert_policy(policy(None, 15)).await;
        store.insert_policy(policy(Some("quebec"), 16)).await;

        let qc = store.compliance_policy("canada", Some("Quebec")).await.unwrap().unwrap();
        assert_eq!(qc.min_age_years, Some(16));

        let on = store.compliance_policy("canada", Some("ontario")).await.unwrap().unwrap();
        assert_eq!(on.min_age_years, Some(15));

        let any = store.compliance_policy("canada", None).await.unwrap().unwrap();
        assert!(any.region.is_none());
    }

    #[tokio::test]
    async fn injected_failures() {
        let store = MemoryStore::new();
        store.set_fail_reads(true);
        assert!(store.spec_by_vin("X").await.is_err());
        store.set_fail_reads(false);
        assert!(store.spec_by_vin("X").await.unwrap().is_none());

        store.set_fail_audit(true);
        let flag = ReviewFlag {
            id: Uuid::now_v7(),
            query: "q".into(),
            lookup_type: ic_protocol::LookupType::Query,
            confidence: Confidence::ZERO,
            quality: ic_protocol::QualityLabel::Failed,
            suggestion: "s".into(),
            created_at: Utc::now(),
        };
        assert!(store.append_review_flag(&flag).await.is_err());
        assert!(store.review_flags().await.is_empty());
    }
}
