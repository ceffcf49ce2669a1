//! Partial-match stage.
//!
//! VINs: best spec sharing the 11-character WMI+VDS prefix. Text: best
//! pattern by substring, reversed word order, or per-token containment.
//! Either way the stored confidence is degraded by the scorer.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Resolution, Resolver, Stage};
use crate::classifier::{Identifier, VIN_PREFIX_LEN};
use crate::context::LookupContext;
use crate::error::EngineResult;
use crate::scorer::ConfidenceScorer;
use crate::store::{PatternQuery, Store};

/// Candidate patterns fetched per text lookup.
const CANDIDATE_LIMIT: usize = 10;

pub struct PartialResolver {
    store: Arc<dyn Store>,
    scorer: ConfidenceScorer,
}

impl PartialResolver {
    pub fn new(store: Arc<dyn Store>, scorer: ConfidenceScorer) -> Self {
        Self { store, scorer }
    }

    async fn resolve_vin(&self, ctx: &LookupContext, vin: &str) -> EngineResult<Option<Resolution>> {
        let Some(prefix) = vin.get(..VIN_PREFIX_LEN) else {
            return Ok(None);
        };
        let best = ctx
            .guard(self.store.specs_by_vin_prefix(prefix, 1))
            .await?
            .into_iter()
            .next();

        Ok(best.map(|mut record| {
            let stored = record.confidence;
            record.confidence = self.scorer.score(Stage::Partial, stored);
            Resolution {
                detail: format!("VIN prefix {prefix} (WMI+VDS) shared with a record in {}", record.source),
                record,
                stage: Stage::Partial,
                stored_confidence: stored,
            }
        }))
    }

    async fn resolve_text(&self, ctx: &LookupContext, key: &str) -> EngineResult<Option<Resolution>> {
        let query = PatternQuery::new(key);
        let mut candidates = ctx
            .guard(self.store.pattern_candidates(&query, CANDIDATE_LIMIT))
            .await?;
        candidates.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then_with(|| b.search_pattern.len().cmp(&a.search_pattern.len()))
        });

        let Some(best) = candidates.into_iter().next() else {
            return Ok(None);
        };
        let how = query
            .match_kind(&best)
            .map(|kind| kind.describe())
            .unwrap_or("pattern match");

        let mut record = best.to_vehicle_record();
        let stored = record.confidence;
        record.confidence = self.scorer.score(Stage::Partial, stored);
        Ok(Some(Resolution {
            detail: format!("{how} against pattern \"{}\"", best.search_pattern),
            record,
            stage: Stage::Partial,
            stored_confidence: stored,
        }))
    }
}

#[async_trait]
impl Resolver for PartialResolver {
    async fn resolve(
        &self,
        ctx: &LookupContext,
        id: &Identifier,
    ) -> EngineResult<Option<Resolution>> {
        match id {
            Identifier::Vin(vin) => self.resolve_vin(ctx, vin).await,
            Identifier::ChassisCode(_) | Identifier::Query(_) => {
                self.resolve_text(ctx, &id.pattern_key()).await
            }
        }
    }

    fn stage(&self) -> Stage {
        Stage::Partial
    }
}
