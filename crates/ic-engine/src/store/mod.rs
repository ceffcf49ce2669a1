//! Backing-store abstraction.
//!
//! The engine only reads, except for idempotent pattern upserts, audit
//! appends and watchlist inserts. Two backends: [`MemoryStore`] for tests and
//! development, [`PgStore`] over the `db` query modules for production.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ic_protocol::{
    CompliancePolicy, Confidence, LookupHistoryEntry, MarketSample, Pattern, ReviewFlag,
    ShippingRoute, StrategicRecommendation, VehicleRecord, WatchlistEntry,
};

use crate::error::EngineResult;
use crate::normalize::{reversed_words, tokens};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Vehicle specification by full uppercase VIN.
    async fn spec_by_vin(&self, vin: &str) -> EngineResult<Option<VehicleRecord>>;

    /// Specifications whose VIN starts with `prefix`, best confidence first.
    async fn specs_by_vin_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> EngineResult<Vec<VehicleRecord>>;

    /// Pattern whose `search_pattern` equals `key` exactly.
    async fn pattern_by_key(&self, key: &str) -> EngineResult<Option<Pattern>>;

    /// Patterns matching `query` by any [`MatchKind`]; ranking is the caller's job.
    async fn pattern_candidates(
        &self,
        query: &PatternQuery,
        limit: usize,
    ) -> EngineResult<Vec<Pattern>>;

    /// Insert unless `search_pattern` already exists. Returns whether a row
    /// was inserted; a conflict is not an error.
    async fn upsert_pattern(&self, pattern: &Pattern) -> EngineResult<bool>;

    /// Region-specific policy if one exists, else the country-wide one.
    async fn compliance_policy(
        &self,
        country: &str,
        region: Option<&str>,
    ) -> EngineResult<Option<CompliancePolicy>>;

    /// Routes for a lane, best confidence first.
    async fn shipping_routes(
        &self,
        origin: &str,
        destination: &str,
    ) -> EngineResult<Vec<ShippingRoute>>;

    /// Samples for a make/model (case-insensitive), newest first.
    async fn market_samples(
        &self,
        make: &str,
        model: &str,
        year: Option<i32>,
    ) -> EngineResult<Vec<MarketSample>>;

    /// "Did you mean" suggestions loosely related to `query`.
    async fn fallback_keywords(
        &self,
        query: &PatternQuery,
        limit: usize,
    ) -> EngineResult<Vec<String>>;

    /// Recommendation rules applicable to a vehicle and destination.
    async fn recommendation_rules(
        &self,
        make: &str,
        model: &str,
        destination: &str,
    ) -> EngineResult<Vec<RecommendationRule>>;

    async fn append_history(&self, entry: &LookupHistoryEntry) -> EngineResult<()>;

    async fn append_review_flag(&self, flag: &ReviewFlag) -> EngineResult<()>;

    /// Returns whether a new entry was created; duplicates are not errors.
    async fn add_watchlist(&self, entry: &WatchlistEntry) -> EngineResult<bool>;
}

/// A normalized free-text query in the shapes the partial matcher needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternQuery {
    pub normalized: String,
    pub reversed: String,
    pub tokens: Vec<String>,
}

impl PatternQuery {
    pub fn new(normalized: &str) -> Self {
        Self {
            normalized: normalized.to_string(),
            reversed: reversed_words(normalized),
            tokens: tokens(normalized),
        }
    }

    /// How (if at all) `pattern` matches this query. Strongest kind wins.
    pub fn match_kind(&self, pattern: &Pattern) -> Option<MatchKind> {
        let stored = pattern.search_pattern.as_str();
        if stored.is_empty() || self.normalized.is_empty() {
            return None;
        }

        if self.normalized.contains(stored) || stored.contains(self.normalized.as_str()) {
            return Some(MatchKind::Substring);
        }

        if self.reversed.contains(stored) || stored.contains(self.reversed.as_str()) {
            return Some(MatchKind::Reordered);
        }

        let haystack = pattern.canonical_text();
        if !self.tokens.is_empty() && self.tokens.iter().all(|t| haystack.contains(t.as_str())) {
            return Some(MatchKind::Tokens);
        }

        None
    }
}

/// Partial-match strategies, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// Query and pattern contain one another.
    Substring,
    /// Containment after reversing the query's word order.
    Reordered,
    /// Every query token appears in make/model/chassis.
    Tokens,
}

impl MatchKind {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Substring => "substring match",
            Self::Reordered => "word-order match",
            Self::Tokens => "token match on make/model/chassis",
        }
    }
}

/// A row of the recommendation table.
///
/// `None` in `make`, `model_pattern` or `destination` means "any".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRule {
    pub make: Option<String>,
    /// Lowercase substring matched against the model name.
    pub model_pattern: Option<String>,
    pub destination: Option<String>,
    pub kind: String,
    pub title: String,
    pub description: String,
    pub timing: String,
    pub alternatives: Vec<String>,
    pub confidence: Confidence,
    pub priority: i32,
}

impl RecommendationRule {
    pub fn applies_to(&self, make: &str, model: &str, destination: &str) -> bool {
        let make_ok = self
            .make
            .as_deref()
            .is_none_or(|m| m.eq_ignore_ascii_case(make));
        let model_ok = self
            .model_pattern
            .as_deref()
            .is_none_or(|p| model.to_lowercase().contains(&p.to_lowercase()));
        let dest_ok = self
            .destination
            .as_deref()
            .is_none_or(|d| d.eq_ignore_ascii_case(destination));
        make_ok && model_ok && dest_ok
    }

    pub fn to_recommendation(&self) -> StrategicRecommendation {
        StrategicRecommendation {
            kind: self.kind.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            timing: self.timing.clone(),
            alternatives: self.alternatives.clone(),
            confidence: self.confidence,
            priority: self.priority,
        }
    }
}

/// A row of the fallback-keyword table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackKeyword {
    /// Known spelling variation, lowercase ("skyline gtr", "gtr r34").
    pub input_variation: String,
    /// Normalized model the variation points at, lowercase.
    pub normalized_model: String,
    /// Text offered to the caller.
    pub suggestion: String,
}

impl FallbackKeyword {
    /// Loose relation used for "did you mean" candidates.
    pub fn relates_to(&self, query: &PatternQuery) -> bool {
        if query.normalized.is_empty() {
            return false;
        }
        if query.normalized.contains(self.input_variation.as_str()) {
            return true;
        }
        query
            .tokens
            .iter()
            .filter(|t| t.len() >= 3)
            .any(|t| self.input_variation.contains(t.as_str()) || self.normalized_model.contains(t.as_str()))
    }
}
