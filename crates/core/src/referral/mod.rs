//! Referral codes and completion rules.

mod code;
mod rules;

pub use code::{generate_code, generate_code_with_suffix, is_valid_code};
pub use rules::{validate_completion, ReferralError, REFERRAL_BONUS_POINTS, REFERRAL_REWARD_POINTS};
