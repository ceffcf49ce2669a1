//! Exact-match stage: full VIN against vehicle specs, anything else
//! against the pattern store's `search_pattern` key.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Resolution, Resolver, Stage};
use crate::classifier::{Identifier, VIN_LEN};
use crate::context::LookupContext;
use crate::error::EngineResult;
use crate::store::Store;

pub struct ExactResolver {
    store: Arc<dyn Store>,
}

impl ExactResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Resolver for ExactResolver {
    async fn resolve(
        &self,
        ctx: &LookupContext,
        id: &Identifier,
    ) -> EngineResult<Option<Resolution>> {
        match id {
            // Bare WMI+VDS prefixes go straight to the partial stage.
            Identifier::Vin(vin) if vin.len() != VIN_LEN => Ok(None),
            Identifier::Vin(vin) => {
                let record = ctx.guard(self.store.spec_by_vin(vin)).await?;
                Ok(record.map(|record| Resolution {
                    stored_confidence: record.confidence,
                    detail: format!("VIN {vin} found in {}", record.source),
                    record,
                    stage: Stage::Exact,
                }))
            }
            Identifier::ChassisCode(_) | Identifier::Query(_) => {
                let key = id.pattern_key();
                let pattern = ctx.guard(self.store.pattern_by_key(&key)).await?;
                Ok(pattern.map(|pattern| {
                    let record = pattern.to_vehicle_record();
                    Resolution {
                        stored_confidence: record.confidence,
                        detail: format!("pattern \"{key}\" from {}", pattern.source),
                        record,
                        stage: Stage::Exact,
                    }
                }))
            }
        }
    }

    fn stage(&self) -> Stage {
        Stage::Exact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ic_protocol::{Confidence, Pattern, VehicleRecord, YearRange};
    use uuid::Uuid;

    use crate::store::MemoryStore;

    fn spec(confidence: i64) -> VehicleRecord {
        VehicleRecord {
            make: "Nissan".into(),
            model: "Q50".into(),
            year: Some(2015),
            year_range: None,
            chassis_code: Some("V37".into()),
            engine_code: Some("VQ37VHR".into()),
            body_type: Some("Sedan".into()),
            confidence: Confidence::new(confidence),
            source: "NHTSA vPIC".into(),
            source_url: Some("https://vpic.nhtsa.dot.gov".into()),
            last_verified: Utc::now(),
        }
    }

    async fn setup() -> (Arc<MemoryStore>, ExactResolver) {
        let store = Arc::new(MemoryStore::new());
        store.insert_spec("JN1CV6AP4FM123456", spec(95)).await;
        store
            .insert_pattern(Pattern {
                id: Uuid::now_v7(),
                search_pattern: "jza80".into(),
                make: "Toyota".into(),
                model: "Supra".into(),
                chassis_code: Some("JZA80".into()),
                year_range: YearRange::new(1993, 2002).ok(),
                engine_pattern: Some("2JZ-GTE".into()),
                confidence: Confidence::new(93),
                source: "Curated".into(),
                auto_learned: false,
                created_at: Utc::now(),
            })
            .await;
        let resolver = ExactResolver::new(store.clone());
        (store, resolver)
    }

    #[tokio::test]
    async fn vin_hit_keeps_stored_confidence() {
        let (_, resolver) = setup().await;
        let res = resolver
            .resolve(&LookupContext::new(), &Identifier::Vin("JN1CV6AP4FM123456".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(res.record.make, "Nissan");
        assert_eq!(res.record.confidence.value(), 95);
        assert_eq!(res.stored_confidence.value(), 95);
    }

    #[tokio::test]
    async fn vin_prefix_is_skipped() {
        let (_, resolver) = setup().await;
        let res = resolver
            .resolve(&LookupContext::new(), &Identifier::Vin("JN1CV6AP4FM".into()))
            .await
            .unwrap();
        assert!(res.is_none());
    }

    #[tokio::test]
    async fn chassis_code_hits_pattern_key() {
        let (_, resolver) = setup().await;
        let res = resolver
            .resolve(&LookupContext::new(), &Identifier::ChassisCode("JZA80".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(res.record.model, "Supra");
        assert_eq!(res.record.confidence.value(), 93);
        assert_eq!(res.record.engine_code.as_deref(), Some("2JZ-GTE"));
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let (store, resolver) = setup().await;
        store.set_fail_reads(true);
        let res = resolver
            .resolve(&LookupContext::new(), &Identifier::Query("supra".into()))
            .await;
        assert!(res.is_err());
    }
}
