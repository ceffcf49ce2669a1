//! Smart Parser engine for ImportCalc.
//!
//! Resolves VINs, chassis codes and free-text queries into vehicle records
//! through an exact → partial → heuristic fallback chain, scores confidence,
//! attaches import risk and recommendations, and answers compliance,
//! shipping and market lookups. Every lookup is audited asynchronously.

pub mod audit;
pub mod classifier;
pub mod config;
pub mod context;
pub mod db;
pub mod engine;
pub mod error;
pub mod gap;
pub mod ledger;
pub mod market;
pub mod normalize;
pub mod resolver;
pub mod risk;
pub mod scorer;
pub mod store;

// Re-export key types for convenience
pub use config::EngineConfig;
pub use context::LookupContext;
pub use engine::SmartParser;
pub use error::{EngineError, EngineResult};
pub use store::{FallbackKeyword, MemoryStore, PgStore, RecommendationRule, Store};

pub use ic_protocol;
