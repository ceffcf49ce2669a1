//! Shared types for the ImportCalc vehicle identity engine.
//!
//! Everything here is plain data: serde-serializable records read from the
//! backing stores, and the response envelope returned by every public
//! engine operation.

pub mod audit;
pub mod compliance;
pub mod confidence;
pub mod envelope;
pub mod market;
pub mod pattern;
pub mod risk;
pub mod shipping;
pub mod vehicle;
pub mod watchlist;

pub use audit::*;
pub use compliance::*;
pub use confidence::*;
pub use envelope::*;
pub use market::*;
pub use pattern::*;
pub use risk::*;
pub use shipping::*;
pub use vehicle::*;
pub use watchlist::*;
