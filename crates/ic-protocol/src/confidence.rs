use serde::{Deserialize, Serialize};

/// Integer trust score in `0..=100`, always paired with a source attribution.
///
/// Construction clamps, so a `Confidence` is in range by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(100);

    /// Clamp any integer into `0..=100`.
    pub fn new(value: i64) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Subtract `points`, saturating at zero.
    pub fn saturating_sub(self, points: u8) -> Self {
        Self(self.0.saturating_sub(points))
    }
}

impl From<i64> for Confidence {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for u8 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}
