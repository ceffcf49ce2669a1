//! Response envelope shared by every public engine operation.
//!
//! Callers distinguish outcomes only through `confidence_score`, `data` and
//! `outcome`; there is no error channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;
use crate::risk::{ImportRiskIndex, StrategicRecommendation};

/// Which path produced the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    /// Direct key hit in a store.
    Exact,
    /// Prefix / fuzzy hit with degraded confidence.
    Partial,
    /// Enthusiast-naming rule hit.
    Heuristic,
    /// Non-identity lookup (compliance, shipping, market) that found data.
    Resolved,
    NoMatch,
    InvalidInput,
    SystemError,
}

impl Outcome {
    pub fn has_data(self) -> bool {
        matches!(
            self,
            Self::Exact | Self::Partial | Self::Heuristic | Self::Resolved
        )
    }
}

/// Per-data-point provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntry {
    pub data_point: String,
    pub source: String,
    pub confidence: Confidence,
    pub last_verified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Suggested follow-up action for the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextStep {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
}

impl NextStep {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority,
            category: category.into(),
            estimated_time: None,
        }
    }

    pub fn with_estimated_time(mut self, estimate: impl Into<String>) -> Self {
        self.estimated_time = Some(estimate.into());
        self
    }
}

/// The stable response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    pub data: Option<T>,
    pub confidence_score: Confidence,
    pub source_attribution: String,
    pub source_breakdown: Vec<SourceEntry>,
    pub why_this_result: String,
    pub next_steps: Vec<NextStep>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_risk_index: Option<ImportRiskIndex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategic_recommendations: Option<Vec<StrategicRecommendation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_suggestions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
}

impl<T> Response<T> {
    /// A response carrying data. `outcome` must be one that has data.
    pub fn found(
        data: T,
        outcome: Outcome,
        confidence: Confidence,
        source_attribution: impl Into<String>,
        source_breakdown: Vec<SourceEntry>,
        why: impl Into<String>,
    ) -> Self {
        debug_assert!(outcome.has_data());
        Self {
            data: Some(data),
            confidence_score: confidence,
            source_attribution: source_attribution.into(),
            source_breakdown,
            why_this_result: why.into(),
            next_steps: Vec::new(),
            outcome,
            import_risk_index: None,
            strategic_recommendations: None,
            fallback_suggestions: None,
            disclaimer: None,
        }
    }

    /// A data-less response; confidence is always zero.
    pub fn empty(outcome: Outcome, why: impl Into<String>, next_steps: Vec<NextStep>) -> Self {
        Self {
            data: None,
            confidence_score: Confidence::ZERO,
            source_attribution: "none".into(),
            source_breakdown: Vec::new(),
            why_this_result: why.into(),
            next_steps,
            outcome,
            import_risk_index: None,
            strategic_recommendations: None,
            fallback_suggestions: None,
            disclaimer: None,
        }
    }

    pub fn with_next_steps(mut self, steps: Vec<NextStep>) -> Self {
        self.next_steps.extend(steps);
        self
    }

    pub fn with_disclaimer(mut self, disclaimer: impl Into<String>) -> Self {
        self.disclaimer = Some(disclaimer.into());
        self
    }

    pub fn with_fallback_suggestions(mut self, suggestions: Vec<String>) -> Self {
        if !suggestions.is_empty() {
            self.fallback_suggestions = Some(suggestions);
        }
        self
    }

    pub fn is_found(&self) -> bool {
        self.data.is_some()
    }
}
