//! Redemption eligibility rules.

use thiserror::Error;
use uuid::Uuid;

use crate::types::UserTier;

/// The perk fields eligibility depends on.
#[derive(Debug, Clone)]
pub struct PerkInfo {
    /// Perk ID.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Cost in points.
    pub points_cost: i64,
    /// Whether redemption requires the premium tier.
    pub is_premium_only: bool,
    /// Whether the perk is currently redeemable at all.
    pub is_active: bool,
}

/// Business-rule failures when redeeming a perk.
///
/// These are expected, frequent outcomes; their messages are shown to the
/// user verbatim and they are never logged as unexpected errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RedemptionError {
    /// Perk is inactive or unknown.
    #[error("This perk is not available")]
    NotAvailable,

    /// Balance does not cover the cost.
    #[error("You need {shortfall} more points")]
    InsufficientPoints {
        /// Exactly how many points the user is short.
        shortfall: i64,
    },

    /// Perk is premium-only and the user is on the free tier.
    #[error("This perk requires a premium membership")]
    PremiumRequired,

    /// Perk has a non-positive cost; catalog misconfiguration.
    #[error("This perk is misconfigured")]
    InvalidCost,
}

/// Checks whether a user may redeem a perk right now.
///
/// Check order matches the user-facing flow: availability, then balance
/// (with the exact shortfall in the message), then premium gating. The
/// caller still re-runs the balance check inside the redemption
/// transaction; this function decides eligibility, not atomicity.
///
/// # Errors
///
/// Returns the specific `RedemptionError` for the first failed rule.
pub fn check_redeemable(
    perk: &PerkInfo,
    tier: UserTier,
    balance: i64,
) -> Result<(), RedemptionError> {
    if !perk.is_active {
        return Err(RedemptionError::NotAvailable);
    }
    if perk.points_cost <= 0 {
        return Err(RedemptionError::InvalidCost);
    }
    if balance < perk.points_cost {
        return Err(RedemptionError::InsufficientPoints {
            shortfall: perk.points_cost - balance,
        });
    }
    if perk.is_premium_only && !tier.is_premium() {
        return Err(RedemptionError::PremiumRequired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perk(points_cost: i64, is_premium_only: bool, is_active: bool) -> PerkInfo {
        PerkInfo {
            id: Uuid::new_v4(),
            title: "Free coffee".to_string(),
            points_cost,
            is_premium_only,
            is_active,
        }
    }

    #[test]
    fn test_redeemable() {
        assert!(check_redeemable(&perk(100, false, true), UserTier::Free, 150).is_ok());
    }

    #[test]
    fn test_exact_balance_is_enough() {
        assert!(check_redeemable(&perk(100, false, true), UserTier::Free, 100).is_ok());
    }

    #[test]
    fn test_inactive_perk() {
        assert_eq!(
            check_redeemable(&perk(100, false, false), UserTier::Premium, 1000),
            Err(RedemptionError::NotAvailable)
        );
    }

    #[test]
    fn test_insufficient_points_reports_shortfall() {
        let err = check_redeemable(&perk(100, false, true), UserTier::Free, 60).unwrap_err();
        assert_eq!(err, RedemptionError::InsufficientPoints { shortfall: 40 });
        assert_eq!(err.to_string(), "You need 40 more points");
    }

    #[test]
    fn test_premium_only_blocks_free_tier() {
        assert_eq!(
            check_redeemable(&perk(100, true, true), UserTier::Free, 500),
            Err(RedemptionError::PremiumRequired)
        );
        assert!(check_redeemable(&perk(100, true, true), UserTier::Premium, 500).is_ok());
    }

    #[test]
    fn test_balance_checked_before_premium_gate() {
        // The shortfall message wins over the premium message
        let err = check_redeemable(&perk(100, true, true), UserTier::Free, 10).unwrap_err();
        assert_eq!(err, RedemptionError::InsufficientPoints { shortfall: 90 });
    }

    #[test]
    fn test_non_positive_cost_rejected() {
        assert_eq!(
            check_redeemable(&perk(0, false, true), UserTier::Free, 100),
            Err(RedemptionError::InvalidCost)
        );
    }
}
