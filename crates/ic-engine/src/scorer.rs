//! Confidence policy shared by every resolver stage.
//!
//! Exact matches keep their stored confidence, partial matches are degraded
//! by a fixed penalty down to a floor (never raised by it), and heuristic
//! hits carry the rule's fixed confidence.

use ic_protocol::Confidence;

use crate::config::EngineConfig;
use crate::resolver::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceScorer {
    penalty: u8,
    floor: u8,
}

impl ConfidenceScorer {
    pub fn new(penalty: u8, floor: u8) -> Self {
        Self {
            penalty,
            floor: floor.min(100),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.partial_penalty, config.partial_floor)
    }

    /// `min(stored, max(stored - penalty, floor))`.
    pub fn degrade(&self, stored: Confidence) -> Confidence {
        let penalized = stored.saturating_sub(self.penalty);
        stored.min(penalized.max(Confidence::new(self.floor.into())))
    }

    /// Confidence a stage reports for a hit whose source carries `stored`.
    pub fn score(&self, stage: Stage, stored: Confidence) -> Confidence {
        match stage {
            Stage::Exact | Stage::Heuristic => stored,
            Stage::Partial => self.degrade(stored),
        }
    }

    /// Human-readable "why this result" line.
    pub fn explain(&self, stage: Stage, detail: &str, stored: Confidence, scored: Confidence) -> String {
        match stage {
            Stage::Exact => format!(
                "Exact match: {detail}. Confidence {scored} is the stored value for this record."
            ),
            Stage::Partial => format!(
                "Partial match: {detail}. Stored confidence {stored} was reduced to {scored} \
                 because the identifier only partly matched; verify before relying on it."
            ),
            Stage::Heuristic => format!(
                "Heuristic match: {detail}. Confidence {scored} is the fixed value for this \
                 naming rule; no database record matched."
            ),
        }
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn partial_degradation_examples() {
        let scorer = ConfidenceScorer::default();
        assert_eq!(scorer.degrade(Confidence::new(95)).value(), 75);
        assert_eq!(scorer.degrade(Confidence::new(80)).value(), 60);
        assert_eq!(scorer.degrade(Confidence::new(70)).value(), 60);
        // The floor never raises a weak stored value.
        assert_eq!(scorer.degrade(Confidence::new(40)).value(), 40);
        assert_eq!(scorer.degrade(Confidence::ZERO).value(), 0);
    }

    #[test]
    fn exact_and_heuristic_are_unchanged() {
        let scorer = ConfidenceScorer::default();
        let c = Confidence::new(88);
        assert_eq!(scorer.score(Stage::Exact, c), c);
        assert_eq!(scorer.score(Stage::Heuristic, c), c);
        assert_eq!(scorer.score(Stage::Partial, c).value(), 68);
    }

    #[test]
    fn explanation_names_stage_and_confidence() {
        let scorer = ConfidenceScorer::default();
        let why = scorer.explain(
            Stage::Partial,
            "VIN prefix JN1CV6AP4FM",
            Confidence::new(95),
            Confidence::new(75),
        );
        assert!(why.starts_with("Partial match"));
        assert!(why.contains("95%"));
        assert!(why.contains("75%"));
    }

    proptest! {
        #[test]
        fn degrade_stays_in_bounds(stored in 0i64..=100) {
            let scorer = ConfidenceScorer::default();
            let stored = Confidence::new(stored);
            let degraded = scorer.degrade(stored);
            prop_assert!(degraded <= stored);
            prop_assert!(degraded.value() <= 100);
            if stored.value() >= 80 {
                prop_assert_eq!(degraded.value(), stored.value() - 20);
            } else {
                prop_assert_eq!(degraded.value(), stored.value().min(60));
            }
        }

        #[test]
        fn degrade_is_monotonic(a in 0i64..=100, b in 0i64..=100) {
            let scorer = ConfidenceScorer::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(scorer.degrade(Confidence::new(lo)) <= scorer.degrade(Confidence::new(hi)));
        }
    }
}
