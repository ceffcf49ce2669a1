//! E2E tests for the exact → partial → heuristic resolution chain.

mod helpers;

use std::sync::Arc;

use helpers::{SEEDED_VIN, SEEDED_VIN_CONFIDENCE, TestHarness};
use ic_protocol::{Outcome, Priority};

/// A seeded VIN resolves exactly with the stored confidence.
#[tokio::test]
async fn e2e_exact_vin_match() {
    let h = TestHarness::with_sample_data().await;

    let resp = h.parser.resolve_identifier(&h.ctx(), SEEDED_VIN).await;

    assert_eq!(resp.outcome, Outcome::Exact);
    assert_eq!(resp.confidence_score.value(), SEEDED_VIN_CONFIDENCE);
    let vehicle = resp.data.as_ref().unwrap();
    assert_eq!(vehicle.make, "Nissan");
    assert!(!resp.source_breakdown.is_empty());
    assert!(resp.source_breakdown.iter().all(|e| e.source == "NHTSA vPIC"));
    assert_eq!(resp.source_attribution, "NHTSA vPIC");
    assert!(resp.why_this_result.starts_with("Exact match"));
    assert!(resp.import_risk_index.is_some());
}

/// decode_vin accepts lowercase input with surrounding whitespace.
#[tokio::test]
async fn e2e_decode_vin_normalizes_case() {
    let h = TestHarness::with_sample_data().await;

    let resp = h
        .parser
        .decode_vin(&h.ctx(), "  jn1cv6ap4fm123456 ")
        .await;

    assert_eq!(resp.outcome, Outcome::Exact);
    assert_eq!(resp.data.unwrap().model, "Q50");
}

/// An 11-character VIN prefix degrades to a partial match, never above the stored value.
#[tokio::test]
async fn e2e_partial_vin_prefix_is_degraded() {
    let h = TestHarness::with_sample_data().await;

    let resp = h.parser.decode_vin(&h.ctx(), "JN1CV6AP4FM").await;

    assert_eq!(resp.outcome, Outcome::Partial);
    assert_eq!(resp.confidence_score.value(), 75);
    assert!(resp.confidence_score.value() < SEEDED_VIN_CONFIDENCE);
    assert!(resp.why_this_result.contains("reduced"));
    assert!(resp.disclaimer.is_some());
    assert!(
        resp.next_steps
            .iter()
            .any(|s| s.category == "verification" && s.priority == Priority::High)
    );
}

/// Curated chassis codes resolve through the pattern table.
#[tokio::test]
async fn e2e_chassis_code_exact() {
    let h = TestHarness::with_sample_data().await;

    let resp = h.parser.resolve_identifier(&h.ctx(), "jza80").await;

    assert_eq!(resp.outcome, Outcome::Exact);
    assert_eq!(resp.confidence_score.value(), 93);
    let vehicle = resp.data.unwrap();
    assert_eq!(vehicle.make, "Toyota");
    assert_eq!(vehicle.engine_code.as_deref(), Some("2JZ-GTE"));
}

/// Reversed word order still finds the stored pattern, at reduced confidence.
#[tokio::test]
async fn e2e_reordered_query_is_partial() {
    let h = TestHarness::with_sample_data().await;

    let resp = h.parser.resolve_identifier(&h.ctx(), "RX7 FD").await;

    assert_eq!(resp.outcome, Outcome::Partial);
    assert_eq!(resp.data.as_ref().unwrap().chassis_code.as_deref(), Some("FD3S"));
    // 88 stored, minus the partial penalty, floored at 60.
    assert_eq!(resp.confidence_score.value(), 68);
}

/// Heuristic hit on first sight, exact match once learned.
#[tokio::test]
async fn e2e_heuristic_then_learned_exact() {
    let h = TestHarness::with_sample_data().await;

    let first = h.parser.resolve_identifier(&h.ctx(), "r34 gtr").await;
    assert_eq!(first.outcome, Outcome::Heuristic);
    assert_eq!(first.source_attribution, "Heuristic Pattern Engine");
    let conf = first.confidence_score.value();
    assert!((85..=95).contains(&conf));
    let vehicle = first.data.as_ref().unwrap();
    assert_eq!(vehicle.make, "Nissan");
    assert_eq!(vehicle.model, "Skyline GT-R");
    assert_eq!(vehicle.chassis_code.as_deref(), Some("BNR34"));
    assert!(first.strategic_recommendations.is_some());

    let second = h.parser.resolve_identifier(&h.ctx(), "R34  GTR").await;
    assert_eq!(second.outcome, Outcome::Exact);
    assert_eq!(second.confidence_score.value(), conf);
    let learned = second.data.unwrap();
    assert_eq!(learned.model, "Skyline GT-R");
    assert_eq!(learned.chassis_code.as_deref(), Some("BNR34"));
    assert_eq!(h.store.pattern_count("r34 gtr").await, 1);
}

/// Identical concurrent misses learn exactly one pattern and all succeed.
#[tokio::test]
async fn e2e_concurrent_learning_is_idempotent() {
    let h = Arc::new(TestHarness::with_sample_data().await);

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let h = h.clone();
            tokio::spawn(async move { h.parser.resolve_identifier(&h.ctx(), "bnr32").await })
        })
        .collect();

    for task in tasks {
        let resp = task.await.unwrap();
        assert!(resp.outcome.has_data());
        assert_eq!(resp.data.unwrap().chassis_code.as_deref(), Some("BNR32"));
    }
    assert_eq!(h.store.pattern_count("bnr32").await, 1);
}

/// Gibberish yields a structured gap with manual-entry guidance.
#[tokio::test]
async fn e2e_gibberish_is_structured_gap() {
    let h = TestHarness::with_sample_data().await;

    let resp = h.parser.resolve_identifier(&h.ctx(), "xyzzy12345").await;

    assert_eq!(resp.outcome, Outcome::NoMatch);
    assert!(resp.confidence_score.is_zero());
    assert!(resp.data.is_none());
    assert!(resp.source_breakdown.is_empty());
    assert!(resp.next_steps.iter().any(|s| s.category == "manual_entry"));
    assert!(resp.import_risk_index.is_none());
}

/// Near misses get "did you mean" suggestions from the keyword table.
#[tokio::test]
async fn e2e_near_miss_gets_suggestions() {
    let h = TestHarness::with_sample_data().await;

    let resp = h.parser.resolve_identifier(&h.ctx(), "skyline 2000").await;

    assert_eq!(resp.outcome, Outcome::NoMatch);
    assert_eq!(
        resp.fallback_suggestions.as_deref(),
        Some(&["Nissan Skyline GT-R".to_string()][..])
    );
}

/// Unknown VINs get a manufacturer hint from the WMI.
#[tokio::test]
async fn e2e_unknown_vin_gets_wmi_hint() {
    let h = TestHarness::with_sample_data().await;

    let resp = h.parser.decode_vin(&h.ctx(), "WBA3A5C51CF256985").await;

    assert_eq!(resp.outcome, Outcome::NoMatch);
    let suggestions = resp.fallback_suggestions.unwrap();
    assert_eq!(suggestions[0], "Manufacturer code WBA suggests BMW");
    assert!(resp.next_steps.iter().any(|s| s.category == "verify_vin"));
}

/// The response serializes with the public field names.
#[tokio::test]
async fn e2e_response_contract_shape() {
    let h = TestHarness::with_sample_data().await;

    let resp = h.parser.resolve_identifier(&h.ctx(), SEEDED_VIN).await;
    let json = serde_json::to_value(&resp).unwrap();

    assert_eq!(json["confidenceScore"], u64::from(SEEDED_VIN_CONFIDENCE));
    assert_eq!(json["outcome"], "exact");
    assert_eq!(json["data"]["make"], "Nissan");
    assert!(json["sourceBreakdown"][0]["lastVerified"].is_string());
    assert!(json["importRiskIndex"]["riskLevel"].is_string());
}
