//! Shared test harness for E2E tests.
//!
//! Wires a `SmartParser` to a `MemoryStore` seeded with a small, realistic
//! reference dataset, exercising the real resolver, scoring and audit paths.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, Utc};
use uuid::Uuid;

use ic_engine::{
    EngineConfig, FallbackKeyword, LookupContext, MemoryStore, RecommendationRule, SmartParser,
};
use ic_protocol::{
    CompliancePolicy, Confidence, MarketSample, Pattern, ShippingRoute, VehicleRecord, YearRange,
};

pub const SEEDED_VIN: &str = "JN1CV6AP4FM123456";
pub const SEEDED_VIN_CONFIDENCE: u8 = 95;

/// Smart Parser plus a handle on its store for seeding and inspection.
pub struct TestHarness {
    pub parser: SmartParser,
    pub store: Arc<MemoryStore>,
}

impl TestHarness {
    /// Harness over the sample dataset below.
    pub async fn with_sample_data() -> Self {
        let harness = Self::empty();
        seed(&harness.store).await;
        harness
    }

    /// Harness over an empty store.
    pub fn empty() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let parser = SmartParser::new(store.clone(), config);
        Self { parser, store }
    }

    pub fn ctx(&self) -> LookupContext {
        LookupContext::new().with_session("e2e")
    }
}

/// Log to the test writer when `RUST_LOG` is set. Safe to call repeatedly.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

async fn seed(store: &MemoryStore) {
    let now = Utc::now();

    store
        .insert_spec(
            SEEDED_VIN,
            VehicleRecord {
                make: "Nissan".into(),
                model: "Q50".into(),
                year: Some(2015),
                year_range: None,
                chassis_code: Some("V37".into()),
                engine_code: Some("VQ37VHR".into()),
                body_type: Some("Sedan".into()),
                confidence: Confidence::new(SEEDED_VIN_CONFIDENCE.into()),
                source: "NHTSA vPIC".into(),
                source_url: Some("https://vpic.nhtsa.dot.gov/".into()),
                last_verified: now,
            },
        )
        .await;

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
            source: "Curated chassis table".into(),
            auto_learned: false,
            created_at: now,
        })
        .await;
    store
        .insert_pattern(Pattern {
            id: Uuid::now_v7(),
            search_pattern: "fd rx7".into(),
            make: "Mazda".into(),
            model: "RX-7".into(),
            chassis_code: Some("FD3S".into()),
            year_range: YearRange::new(1992, 2002).ok(),
            engine_pattern: Some("13B-REW".into()),
            confidence: Confidence::new(88),
            source: "Curated chassis table".into(),
            auto_learned: false,
            created_at: now,
        })
        .await;

    store
        .insert_policy(CompliancePolicy {
            country: "australia".into(),
            region: None,
            min_age_years: Some(25),
            max_age_years: None,
            requirements: vec![
                "Vehicle import approval".into(),
                "RAWS compliance or concessional registration".into(),
            ],
            costs: BTreeMap::from([
                ("import approval".to_string(), 5_000),
                ("compliance".to_string(), 250_000),
            ]),
            special_notes: vec![],
            confidence: Confidence::new(90),
            source: "Department of Infrastructure".into(),
            source_url: None,
            last_verified: now,
        })
        .await;
    store
        .insert_policy(CompliancePolicy {
            country: "united states".into(),
            region: None,
            min_age_years: Some(25),
            max_age_years: None,
            requirements: vec!["EPA and DOT exemption".into()],
            costs: BTreeMap::new(),
            special_notes: vec![],
            confidence: Confidence::new(85),
            source: "NHTSA".into(),
            source_url: None,
            last_verified: now,
        })
        .await;

    for (port, cost, confidence, verified_days_ago) in [
        ("Yokohama", 320_000, 85, 14),
        ("Osaka", 290_000, 70, 60),
    ] {
        store
            .insert_route(ShippingRoute {
                origin_country: "japan".into(),
                destination_country: "australia".into(),
                origin_port: port.into(),
                destination_port: "Melbourne".into(),
                cost_minor: cost,
                currency: "AUD".into(),
                transit_days: 18,
                service_type: "RoRo".into(),
                confidence: Confidence::new(confidence),
                source: "Forwarder quote".into(),
                last_verified: now - Duration::days(verified_days_ago),
            })
            .await;
    }

    for (days_ago, price, site) in [
        (3, 7_500_000, "Bring a Trailer"),
        (20, 6_900_000, "Cars & Bids"),
        (45, 7_100_000, "Bring a Trailer"),
    ] {
        store
            .insert_sample(MarketSample {
                make: "Nissan".into(),
                model: "Skyline GT-R".into(),
                year: Some(1999),
                price_minor: price,
                currency: "USD".into(),
                listing_date: now - Duration::days(days_ago),
                source_site: site.into(),
                url: None,
            })
            .await;
    }

    store
        .insert_keyword(FallbackKeyword {
            input_variation: "skyline gtr".into(),
            normalized_model: "skyline gt-r".into(),
            suggestion: "Nissan Skyline GT-R".into(),
        })
        .await;

    store
        .insert_rule(RecommendationRule {
            make: Some("Nissan".into()),
            model_pattern: Some("skyline".into()),
            destination: None,
            kind: "timing".into(),
            title: "Buy before the 25-year window opens".into(),
            description: "Prices rise sharply once a chassis becomes import-eligible.".into(),
            timing: "6-12 months before eligibility".into(),
            alternatives: vec!["Consider an R33 GT-R".into()],
            confidence: Confidence::new(75),
            priority: 8,
        })
        .await;
}
