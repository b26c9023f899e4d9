//! Perk catalog rules and redemption eligibility.

mod rules;

pub use rules::{check_redeemable, PerkInfo, RedemptionError};
