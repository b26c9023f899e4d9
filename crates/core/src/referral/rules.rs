//! Referral completion guards.

use thiserror::Error;
use uuid::Uuid;

/// Points granted to the referrer on a completed referral.
pub const REFERRAL_REWARD_POINTS: i64 = 250;
/// Welcome bonus granted to the referred user.
pub const REFERRAL_BONUS_POINTS: i64 = 250;

/// Business-rule failures when completing a referral.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferralError {
    /// Code does not match any user.
    #[error("Referral code not found")]
    CodeNotFound,

    /// Code is not in the accepted format.
    #[error("Invalid referral code format")]
    InvalidCodeFormat,

    /// Users cannot refer themselves.
    #[error("You cannot refer yourself")]
    SelfReferral,

    /// The new user already consumed a referral code.
    #[error("You have already used a referral code")]
    AlreadyReferred,

    /// This (referrer, referred) pair was already processed.
    #[error("This referral has already been processed")]
    AlreadyProcessed,
}

/// Validates a referral completion before any storage writes.
///
/// The storage layer re-enforces the `AlreadyReferred` and
/// `AlreadyProcessed` guards with conditional updates and unique indexes;
/// this pre-check exists so the common failure paths produce their
/// specific messages without burning a transaction.
///
/// # Errors
///
/// Returns the `ReferralError` for the first violated guard.
pub fn validate_completion(
    referrer_id: Uuid,
    new_user_id: Uuid,
    new_user_referred_by: Option<&str>,
    pair_already_exists: bool,
) -> Result<(), ReferralError> {
    if referrer_id == new_user_id {
        return Err(ReferralError::SelfReferral);
    }
    if new_user_referred_by.is_some() {
        return Err(ReferralError::AlreadyReferred);
    }
    if pair_already_exists {
        return Err(ReferralError::AlreadyProcessed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_completion() {
        let referrer = Uuid::new_v4();
        let newcomer = Uuid::new_v4();
        assert!(validate_completion(referrer, newcomer, None, false).is_ok());
    }

    #[test]
    fn test_self_referral_rejected() {
        let user = Uuid::new_v4();
        assert_eq!(
            validate_completion(user, user, None, false),
            Err(ReferralError::SelfReferral)
        );
    }

    #[test]
    fn test_already_referred_rejected() {
        let referrer = Uuid::new_v4();
        let newcomer = Uuid::new_v4();
        assert_eq!(
            validate_completion(referrer, newcomer, Some("OTHERCODE1"), false),
            Err(ReferralError::AlreadyReferred)
        );
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let referrer = Uuid::new_v4();
        let newcomer = Uuid::new_v4();
        assert_eq!(
            validate_completion(referrer, newcomer, None, true),
            Err(ReferralError::AlreadyProcessed)
        );
    }

    #[test]
    fn test_reward_constants() {
        assert_eq!(REFERRAL_REWARD_POINTS, 250);
        assert_eq!(REFERRAL_BONUS_POINTS, 250);
    }
}
