//! Import Risk Index and strategic recommendation ranking.
//!
//! The index is a sum of weighted factors clamped to `0..=100`, banded by
//! [`RiskLevel::from_score`].

use ic_protocol::{ImportRiskIndex, RiskFactor, RiskLevel, StrategicRecommendation};

use crate::store::RecommendationRule;

/// Age eligibility threshold when the destination has no policy on file.
pub const DEFAULT_AGE_THRESHOLD: u32 = 25;

/// Years before eligibility during which age proximity adds risk.
const PROXIMITY_WINDOW: u32 = 5;
const POINTS_PER_PROXIMITY_YEAR: i32 = 20;

const COMPLEX_MODELS: &[&str] = &["skyline", "gtr", "gt-r", "supra", "rx7", "rx-7", "nsx"];
const COMPLEXITY_POINTS: i32 = 25;

/// Destinations with historically stable import rules.
const STABILITY_ADJUSTMENTS: &[(&str, i32)] = &[
    ("canada", -10),
    ("united states", -10),
    ("new zealand", -5),
    ("united kingdom", -5),
];

/// Everything the index is computed from.
#[derive(Debug, Clone)]
pub struct RiskInput<'a> {
    pub make: &'a str,
    pub model: &'a str,
    pub year: Option<i32>,
    /// Canonical (lowercase) destination country.
    pub destination: &'a str,
    pub age_threshold: u32,
    pub current_year: i32,
}

pub fn assess(input: &RiskInput<'_>) -> ImportRiskIndex {
    let mut factors = Vec::new();

    if let Some(year) = input.year {
        let age = u32::try_from(input.current_year.saturating_sub(year)).unwrap_or(0);
        let remaining = input.age_threshold.saturating_sub(age);
        if (1..PROXIMITY_WINDOW).contains(&remaining) {
            let impact = (PROXIMITY_WINDOW - remaining) as i32 * POINTS_PER_PROXIMITY_YEAR;
            factors.push(RiskFactor {
                name: "Age threshold proximity".into(),
                impact,
                description: format!(
                    "{remaining} year(s) until the {}-year eligibility threshold",
                    input.age_threshold
                ),
            });
        }
    }

    let model = input.model.to_lowercase();
    if let Some(hit) = COMPLEX_MODELS.iter().find(|m| model.contains(*m)) {
        factors.push(RiskFactor {
            name: "Model complexity".into(),
            impact: COMPLEXITY_POINTS,
            description: format!("\"{hit}\" models are historically hard to certify"),
        });
    }

    if let Some((_, adjustment)) = STABILITY_ADJUSTMENTS
        .iter()
        .find(|(country, _)| *country == input.destination)
    {
        factors.push(RiskFactor {
            name: "Destination stability".into(),
            impact: *adjustment,
            description: format!("{} has historically stable import rules", input.destination),
        });
    }

    let total: i32 = factors.iter().map(|f| f.impact).sum();
    let score = total.clamp(0, 100) as u8;
    let risk_level = RiskLevel::from_score(score);
    let explanation = explain(input, risk_level, &factors);

    ImportRiskIndex {
        score,
        risk_level,
        factors,
        explanation,
    }
}

fn explain(input: &RiskInput<'_>, level: RiskLevel, factors: &[RiskFactor]) -> String {
    let vehicle = format!("{} {}", input.make, input.model);
    let dest = input.destination;
    let mut text = match level {
        RiskLevel::Low => format!(
            "Low import risk for the {vehicle} into {dest}: no major eligibility or \
             certification obstacles were identified."
        ),
        RiskLevel::Medium => format!(
            "Moderate import risk for the {vehicle} into {dest}: expect additional paperwork \
             or a short wait before the vehicle qualifies."
        ),
        RiskLevel::High => format!(
            "High import risk for the {vehicle} into {dest}: plan timing and certification \
             carefully before committing to a purchase."
        ),
        RiskLevel::Critical => format!(
            "Critical import risk for the {vehicle} into {dest}: importing now is unlikely to \
             succeed without an exemption; consider waiting or an alternative model."
        ),
    };
    if !factors.is_empty() {
        let names: Vec<&str> = factors.iter().map(|f| f.name.as_str()).collect();
        text.push_str(&format!(" Contributing factors: {}.", names.join(", ")));
    }
    text
}

/// Highest priority first, then highest confidence; at most `limit`.
pub fn rank_recommendations(
    mut rules: Vec<RecommendationRule>,
    limit: usize,
) -> Vec<StrategicRecommendation> {
    rules.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.confidence.cmp(&a.confidence))
    });
    rules
        .iter()
        .take(limit)
        .map(RecommendationRule::to_recommendation)
        .collect()
}
