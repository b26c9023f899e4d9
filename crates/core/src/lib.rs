//! Core business logic for DankPass.
//!
//! This crate implements the receipt-to-points pipeline: deduplication,
//! AI-based extraction, reconciliation, points calculation, the receipt
//! lifecycle, perk redemption rules, and the referral engine. It has no
//! web or database dependencies; persistence-dependent state is passed in
//! by callers.

pub mod extraction;
pub mod ledger;
pub mod perk;
pub mod points;
pub mod receipt;
pub mod referral;
pub mod types;

pub use types::{PartnerStatus, UserTier};
