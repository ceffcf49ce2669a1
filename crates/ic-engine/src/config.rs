//! Engine configuration, loadable from defaults, environment, or TOML.

use serde::Deserialize;

use crate::error::{EngineError, EngineResult};

/// Tunables for the resolution chain, scoring and audit queue.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Results below this confidence are flagged for review.
    #[serde(default = "default_review_threshold")]
    pub review_threshold: u8,
    /// Points subtracted from a stored confidence on a partial match.
    #[serde(default = "default_partial_penalty")]
    pub partial_penalty: u8,
    /// Lowest confidence a partial match is degraded to.
    #[serde(default = "default_partial_floor")]
    pub partial_floor: u8,
    /// Identifiers shorter than this are rejected as invalid input.
    #[serde(default = "default_min_identifier_len")]
    pub min_identifier_len: usize,
    #[serde(default = "default_max_fallback_suggestions")]
    pub max_fallback_suggestions: usize,
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,
    /// Bounded audit queue size; writes beyond it are dropped with a warning.
    #[serde(default = "default_audit_queue_capacity")]
    pub audit_queue_capacity: usize,
    /// Destination used for risk enrichment when the caller gives none.
    #[serde(default = "default_destination")]
    pub default_destination: String,
    /// PostgreSQL connection URL. None selects the in-memory store.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_review_threshold() -> u8 {
    75
}

fn default_partial_penalty() -> u8 {
    20
}

fn default_partial_floor() -> u8 {
    60
}

fn default_min_identifier_len() -> usize {
    2
}

fn default_max_fallback_suggestions() -> usize {
    5
}

fn default_max_recommendations() -> usize {
    3
}

fn default_audit_queue_capacity() -> usize {
    1024
}

fn default_destination() -> String {
    "united states".to_string()
}

fn default_max_connections() -> u32 {
    10
}

impl EngineConfig {
    /// Load config from environment variables, defaulting anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_parse("IC_REVIEW_THRESHOLD") {
            config.review_threshold = v;
        }
        if let Some(v) = env_parse("IC_AUDIT_QUEUE_CAPACITY") {
            config.audit_queue_capacity = v;
        }
        if let Ok(dest) = std::env::var("IC_DEFAULT_DESTINATION") {
            config.default_destination = dest.trim().to_lowercase();
        }
        config.database_url = std::env::var("DATABASE_URL").ok();
        config
    }

    /// Reject settings the engine cannot honor.
    pub fn validate(&self) -> EngineResult<()> {
        if self.review_threshold > 100 || self.partial_floor > 100 {
            return Err(EngineError::Config(
                "review_threshold and partial_floor are confidences (0-100)".into(),
            ));
        }
        if self.min_identifier_len == 0 {
            return Err(EngineError::Config("min_identifier_len must be at least 1".into()));
        }
        if self.default_destination.trim().is_empty() {
            return Err(EngineError::Config("default_destination must not be empty".into()));
        }
        Ok(())
    }

    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            review_threshold: default_review_threshold(),
            partial_penalty: default_partial_penalty(),
            partial_floor: default_partial_floor(),
            min_identifier_len: default_min_identifier_len(),
            max_fallback_suggestions: default_max_fallback_suggestions(),
            max_recommendations: default_max_recommendations(),
            audit_queue_capacity: default_audit_queue_capacity(),
            default_destination: default_destination(),
            database_url: None,
            max_connections: default_max_connections(),
        }
    }
}
