//! Resolver stages and the fallback chain that runs them in order.
//!
//! Exact → Partial → Heuristic. The first stage that produces a
//! [`Resolution`] wins; later stages are never consulted.

pub mod exact;
pub mod heuristic;
pub mod partial;

use std::sync::Arc;

use async_trait::async_trait;

use ic_protocol::{Confidence, Outcome, VehicleRecord};

use crate::classifier::Identifier;
use crate::context::LookupContext;
use crate::error::EngineResult;
use crate::scorer::ConfidenceScorer;
use crate::store::Store;

pub use exact::ExactResolver;
pub use heuristic::HeuristicResolver;
pub use partial::PartialResolver;

/// Which resolver produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Exact,
    Partial,
    Heuristic,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Partial => "partial",
            Self::Heuristic => "heuristic",
        }
    }

    pub fn outcome(self) -> Outcome {
        match self {
            Self::Exact => Outcome::Exact,
            Self::Partial => Outcome::Partial,
            Self::Heuristic => Outcome::Heuristic,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage hit. `record.confidence` is already scored for the stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub record: VehicleRecord,
    pub stage: Stage,
    /// Confidence of the underlying row or rule before scoring.
    pub stored_confidence: Confidence,
    /// What matched, for the explanation ("VIN prefix JN1CV6AP4FM").
    pub detail: String,
}

/// One stage of the fallback chain.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve an identifier, or `None` if this stage has nothing.
    async fn resolve(
        &self,
        ctx: &LookupContext,
        id: &Identifier,
    ) -> EngineResult<Option<Resolution>>;

    fn stage(&self) -> Stage;
}

/// Ordered resolver stages; stops at the first hit.
pub struct FallbackChain {
    stages: Vec<Box<dyn Resolver>>,
}

impl FallbackChain {
    pub fn new(stages: Vec<Box<dyn Resolver>>) -> Self {
        Self { stages }
    }

    /// Exact, partial and heuristic stages over one store.
    pub fn standard(store: Arc<dyn Store>, scorer: ConfidenceScorer) -> Self {
        Self::new(vec![
            Box::new(ExactResolver::new(store.clone())),
            Box::new(PartialResolver::new(store.clone(), scorer)),
            Box::new(HeuristicResolver::new(store)),
        ])
    }

    pub async fn resolve(
        &self,
        ctx: &LookupContext,
        id: &Identifier,
    ) -> EngineResult<Option<Resolution>> {
        for stage in &self.stages {
            ctx.check()?;
            if let Some(resolution) = stage.resolve(ctx, id).await? {
                tracing::info!(
                    stage = %resolution.stage,
                    confidence = resolution.record.confidence.value(),
                    identifier = id.as_str(),
                    "identifier resolved"
                );
                return Ok(Some(resolution));
            }
            tracing::debug!(stage = %stage.stage(), identifier = id.as_str(), "stage missed, falling back");
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::error::EngineError;

    /// Stage that always returns a fixed result (or None).
    struct MockResolver {
        stage: Stage,
        confidence: Option<i64>,
    }

    impl MockResolver {
        fn hit(stage: Stage, confidence: i64) -> Box<dyn Resolver> {
            Box::new(Self {
                stage,
                confidence: Some(confidence),
            })
        }

        fn miss(stage: Stage) -> Box<dyn Resolver> {
            Box::new(Self {
                stage,
                confidence: None,
            })
        }
    }

    #[async_trait]
    impl Resolver for MockResolver {
        async fn resolve(
            &self,
            _ctx: &LookupContext,
            _id: &Identifier,
        ) -> EngineResult<Option<Resolution>> {
            Ok(self.confidence.map(|c| Resolution {
                record: VehicleRecord {
                    make: "Toyota".into(),
                    model: "Supra".into(),
                    year: None,
                    year_range: None,
                    chassis_code: None,
                    engine_code: None,
                    body_type: None,
                    confidence: Confidence::new(c),
                    source: self.stage.as_str().into(),
                    source_url: None,
                    last_verified: Utc::now(),
                },
                stage: self.stage,
                stored_confidence: Confidence::new(c),
                detail: "mock".into(),
            }))
        }

        fn stage(&self) -> Stage {
            self.stage
        }
    }

    struct FailingResolver;

    #[async_trait]
    impl Resolver for FailingResolver {
        async fn resolve(
            &self,
            _ctx: &LookupContext,
            _id: &Identifier,
        ) -> EngineResult<Option<Resolution>> {
            Err(EngineError::Store("down".into()))
        }

        fn stage(&self) -> Stage {
            Stage::Partial
        }
    }

    fn query() -> Identifier {
        Identifier::Query("supra".into())
    }

    #[tokio::test]
    async fn first_hit_wins() {
        let chain = FallbackChain::new(vec![
            MockResolver::hit(Stage::Exact, 95),
            MockResolver::hit(Stage::Partial, 70),
        ]);
        let res = chain.resolve(&LookupContext::new(), &query()).await.unwrap().unwrap();
        assert_eq!(res.stage, Stage::Exact);
    }

    #[tokio::test]
    async fn falls_through_misses() {
        let chain = FallbackChain::new(vec![
            MockResolver::miss(Stage::Exact),
            MockResolver::miss(Stage::Partial),
            MockResolver::hit(Stage::Heuristic, 90),
        ]);
        let res = chain.resolve(&LookupContext::new(), &query()).await.unwrap().unwrap();
        assert_eq!(res.stage, Stage::Heuristic);
        assert_eq!(res.record.confidence.value(), 90);
    }

    #[tokio::test]
    async fn all_miss_is_none() {
        let chain = FallbackChain::new(vec![MockResolver::miss(Stage::Exact)]);
        assert!(chain.resolve(&LookupContext::new(), &query()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stage_error_stops_the_chain() {
        let chain = FallbackChain::new(vec![
            MockResolver::miss(Stage::Exact),
            Box::new(FailingResolver),
            MockResolver::hit(Stage::Heuristic, 90),
        ]);
        let err = chain.resolve(&LookupContext::new(), &query()).await.unwrap_err();
        assert!(matches!(err, EngineError::Store(_)));
    }

    #[tokio::test]
    async fn cancelled_context_never_runs_stages() {
        let ctx = LookupContext::new();
        ctx.cancellation_token().cancel();
        let chain = FallbackChain::new(vec![MockResolver::hit(Stage::Exact, 95)]);
        let err = chain.resolve(&ctx, &query()).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }
}
