//! Points calculation engine.
//!
//! Computes base and bonus points for a monetary amount given the user's
//! tier, partner network status, and the operator-tunable configuration.
//! The engine is pure: ledger state (today's earned total) and config are
//! passed in, and the caller decides whether to write a ledger entry.

mod engine;
mod error;
mod types;

pub use engine::PointsEngine;
pub use error::PointsError;
pub use types::{PointsBreakdown, PointsConfig};
