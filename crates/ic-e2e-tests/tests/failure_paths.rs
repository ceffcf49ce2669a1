//! E2E tests for store failures, cancellation, deadlines and the audit trail.

mod helpers;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use helpers::{SEEDED_VIN, TestHarness};
use ic_engine::LookupContext;
use ic_protocol::{LookupType, Outcome, QualityLabel};

/// A failing store surfaces as a confidence-0 system error, never a panic.
#[tokio::test]
async fn e2e_store_failure_is_system_error() {
    let h = TestHarness::with_sample_data().await;
    h.store.set_fail_reads(true);

    let resp = h.parser.resolve_identifier(&h.ctx(), SEEDED_VIN).await;
    assert_eq!(resp.outcome, Outcome::SystemError);
    assert!(resp.confidence_score.is_zero());
    assert!(resp.data.is_none());
    assert_eq!(resp.next_steps[0].category, "retry");
    // Internal error text stays internal.
    assert!(!resp.why_this_result.contains("injected"));

    let resp = h
        .parser
        .check_compliance(&h.ctx(), "australia", Some(1995), None)
        .await;
    assert_eq!(resp.outcome, Outcome::SystemError);
}

/// Audit write failures never change the primary result.
#[tokio::test]
async fn e2e_audit_failure_is_isolated() {
    let h = TestHarness::with_sample_data().await;
    h.store.set_fail_audit(true);

    let resp = h.parser.resolve_identifier(&h.ctx(), SEEDED_VIN).await;
    h.parser.flush().await;

    assert_eq!(resp.outcome, Outcome::Exact);
    assert!(h.store.history().await.is_empty());
}

/// A failed pattern write still returns the heuristic match.
#[tokio::test]
async fn e2e_learning_failure_is_isolated() {
    let h = TestHarness::with_sample_data().await;
    h.store.set_fail_writes(true);

    let resp = h.parser.resolve_identifier(&h.ctx(), "r33 gtr").await;

    assert_eq!(resp.outcome, Outcome::Heuristic);
    assert_eq!(resp.data.unwrap().chassis_code.as_deref(), Some("BCNR33"));
    assert_eq!(h.store.pattern_count("r33 gtr").await, 0);
}

/// A cancelled context short-circuits to a system error.
#[tokio::test]
async fn e2e_cancelled_lookup() {
    let h = TestHarness::with_sample_data().await;
    let token = CancellationToken::new();
    let ctx = LookupContext::new().with_cancellation(token.clone());
    token.cancel();

    let resp = h.parser.resolve_identifier(&ctx, SEEDED_VIN).await;

    assert_eq!(resp.outcome, Outcome::SystemError);
    assert!(resp.why_this_result.contains("cancelled"));
}

/// An expired deadline short-circuits to a system error.
#[tokio::test]
async fn e2e_expired_deadline() {
    let h = TestHarness::with_sample_data().await;
    let ctx = LookupContext::with_timeout(Duration::ZERO);

    let resp = h
        .parser
        .shipping_estimate(&ctx, "japan", "australia")
        .await;

    assert_eq!(resp.outcome, Outcome::SystemError);
    assert!(resp.why_this_result.contains("deadline"));
}

/// Malformed input is rejected before any store access.
#[tokio::test]
async fn e2e_invalid_input() {
    let h = TestHarness::with_sample_data().await;
    h.store.set_fail_reads(true);

    let resp = h.parser.resolve_identifier(&h.ctx(), "   ").await;
    assert_eq!(resp.outcome, Outcome::InvalidInput);
    assert!(resp.confidence_score.is_zero());

    let resp = h.parser.decode_vin(&h.ctx(), "JN1-CV6").await;
    assert_eq!(resp.outcome, Outcome::InvalidInput);
    assert!(resp.next_steps.iter().any(|s| s.category == "fix_input"));
}

/// Every lookup is written to history; failures and weak matches are flagged.
#[tokio::test]
async fn e2e_audit_trail_and_review_flags() {
    let h = TestHarness::with_sample_data().await;
    let ctx = LookupContext::new()
        .with_user("user-7")
        .with_session("batch-1");

    h.parser.resolve_identifier(&ctx, SEEDED_VIN).await;
    h.parser.resolve_identifier(&ctx, "xyzzy12345").await;
    h.parser.resolve_identifier(&ctx, "rx7 fd").await;
    h.parser.market_pricing(&ctx, "Nissan", "Skyline GT-R", None).await;
    h.parser.flush().await;

    let history = h.store.history().await;
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].lookup_type, LookupType::Vin);
    assert_eq!(history[3].lookup_type, LookupType::Market);
    assert!(history.iter().all(|e| e.user_id.as_deref() == Some("user-7")));
    assert_eq!(history[0].result["outcome"], "exact");

    let flags = h.store.review_flags().await;
    // The market summary from three samples scores 70, under the review threshold.
    assert_eq!(flags.len(), 3);
    assert_eq!(flags[0].query, "xyzzy12345");
    assert_eq!(flags[0].quality, QualityLabel::Failed);
    assert_eq!(flags[1].quality, QualityLabel::LowConfidence);
    assert_eq!(flags[1].confidence.value(), 68);
    assert_eq!(flags[2].lookup_type, LookupType::Market);
}

/// Shutdown drains queued writes; later lookups still answer but are not audited.
#[tokio::test]
async fn e2e_shutdown_drains_audit() {
    let h = TestHarness::with_sample_data().await;

    for _ in 0..5 {
        h.parser.resolve_identifier(&h.ctx(), SEEDED_VIN).await;
    }
    h.parser.shutdown().await;
    assert_eq!(h.store.history().await.len(), 5);

    let resp = h.parser.resolve_identifier(&h.ctx(), SEEDED_VIN).await;
    assert_eq!(resp.outcome, Outcome::Exact);
    h.parser.flush().await;
    assert_eq!(h.store.history().await.len(), 5);
}
