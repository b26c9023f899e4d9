//! Pure points calculation.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::error::PointsError;
use super::types::{PointsBreakdown, PointsConfig};
use crate::types::{PartnerStatus, UserTier};

/// Points calculation engine.
///
/// All state the calculation depends on (config, partner status, today's
/// earned total) is passed in, so the same inputs always produce the same
/// breakdown.
pub struct PointsEngine;

impl PointsEngine {
    /// Calculate the points breakdown for a purchase amount.
    ///
    /// Multiplier tiers are exclusive, highest specificity first:
    /// premium + in-network, premium only, in-network only, neither.
    /// Premium and in-network multipliers compose multiplicatively.
    ///
    /// `earned_today` is the user's pre-award sum of `earned`-type ledger
    /// entries for the current UTC calendar day; the award is truncated to
    /// the remaining headroom under `daily_cap`.
    ///
    /// # Errors
    ///
    /// Returns `PointsError` for negative amounts, invalid config, or
    /// amounts too large to represent as points.
    pub fn calculate(
        amount: Decimal,
        tier: UserTier,
        partner_status: Option<PartnerStatus>,
        earned_today: i64,
        config: &PointsConfig,
    ) -> Result<PointsBreakdown, PointsError> {
        if amount < Decimal::ZERO {
            return Err(PointsError::NegativeAmount);
        }
        Self::validate_config(config)?;

        let is_premium = tier.is_premium();
        let is_in_network = partner_status.is_some_and(|s| s.is_in_network());

        let base_points = (amount * config.base_rate)
            .floor()
            .to_i64()
            .ok_or(PointsError::AmountOutOfRange)?;

        let multiplier = match (is_premium, is_in_network) {
            (true, true) => config.premium_multiplier * config.in_network_multiplier,
            (true, false) => config.premium_multiplier,
            (false, true) => config.in_network_multiplier,
            (false, false) => Decimal::ONE,
        };

        let total_points = (Decimal::from(base_points) * multiplier)
            .floor()
            .to_i64()
            .ok_or(PointsError::AmountOutOfRange)?;
        let bonus_points = total_points - base_points;

        let daily_cap_reached = earned_today >= config.daily_cap;
        let headroom = (config.daily_cap - earned_today).max(0);
        let awardable_points = total_points.min(headroom);

        Ok(PointsBreakdown {
            base_points,
            multiplier,
            bonus_points,
            total_points,
            awardable_points,
            is_premium,
            is_in_network,
            daily_cap_reached,
        })
    }

    fn validate_config(config: &PointsConfig) -> Result<(), PointsError> {
        if config.base_rate < Decimal::ZERO {
            return Err(PointsError::InvalidConfig("base_rate is negative".into()));
        }
        if config.premium_multiplier < Decimal::ZERO
            || config.in_network_multiplier < Decimal::ZERO
        {
            return Err(PointsError::InvalidConfig("multiplier is negative".into()));
        }
        if config.daily_cap < 0 {
            return Err(PointsError::InvalidConfig("daily_cap is negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config() -> PointsConfig {
        PointsConfig {
            base_rate: dec!(1),
            premium_multiplier: dec!(1.5),
            in_network_multiplier: dec!(2),
            daily_cap: 2000,
        }
    }

    #[test]
    fn test_basic_earn_free_no_partner() {
        // $45.00, free tier, no partner -> 45 points, multiplier 1
        let result =
            PointsEngine::calculate(dec!(45.00), UserTier::Free, None, 0, &config()).unwrap();

        assert_eq!(result.base_points, 45);
        assert_eq!(result.multiplier, dec!(1));
        assert_eq!(result.bonus_points, 0);
        assert_eq!(result.total_points, 45);
        assert_eq!(result.awardable_points, 45);
        assert!(!result.is_premium);
        assert!(!result.is_in_network);
        assert!(!result.daily_cap_reached);
    }

    #[test]
    fn test_premium_and_in_network_multiplicative() {
        // $67.25, premium, approved partner -> base 67, x3.0 -> 201
        let result = PointsEngine::calculate(
            dec!(67.25),
            UserTier::Premium,
            Some(PartnerStatus::Approved),
            0,
            &config(),
        )
        .unwrap();

        assert_eq!(result.base_points, 67);
        assert_eq!(result.multiplier, dec!(3.0));
        assert_eq!(result.total_points, 201);
        assert_eq!(result.bonus_points, 134);
        assert!(result.is_premium);
        assert!(result.is_in_network);
    }

    #[test]
    fn test_premium_only() {
        let result =
            PointsEngine::calculate(dec!(100), UserTier::Premium, None, 0, &config()).unwrap();

        assert_eq!(result.base_points, 100);
        assert_eq!(result.multiplier, dec!(1.5));
        assert_eq!(result.total_points, 150);
        assert_eq!(result.bonus_points, 50);
    }

    #[test]
    fn test_in_network_only() {
        let result = PointsEngine::calculate(
            dec!(100),
            UserTier::Free,
            Some(PartnerStatus::Approved),
            0,
            &config(),
        )
        .unwrap();

        assert_eq!(result.multiplier, dec!(2));
        assert_eq!(result.total_points, 200);
    }

    #[test]
    fn test_pending_partner_is_not_in_network() {
        let result = PointsEngine::calculate(
            dec!(100),
            UserTier::Free,
            Some(PartnerStatus::Pending),
            0,
            &config(),
        )
        .unwrap();

        assert!(!result.is_in_network);
        assert_eq!(result.multiplier, dec!(1));
    }

    #[test]
    fn test_cap_partial_award() {
        // 1980 earned so far, cap 2000, computed 90 -> award only 20
        let result =
            PointsEngine::calculate(dec!(90), UserTier::Free, None, 1980, &config()).unwrap();

        assert_eq!(result.total_points, 90);
        assert_eq!(result.awardable_points, 20);
        assert!(!result.daily_cap_reached);
    }

    #[test]
    fn test_cap_already_reached() {
        let result =
            PointsEngine::calculate(dec!(50), UserTier::Free, None, 2000, &config()).unwrap();

        assert_eq!(result.awardable_points, 0);
        assert!(result.daily_cap_reached);
    }

    #[test]
    fn test_cap_exceeded_pre_award() {
        // Over-cap totals never produce a negative award
        let result =
            PointsEngine::calculate(dec!(50), UserTier::Free, None, 2500, &config()).unwrap();

        assert_eq!(result.awardable_points, 0);
        assert!(result.daily_cap_reached);
    }

    #[test]
    fn test_fractional_amount_floors() {
        let result =
            PointsEngine::calculate(dec!(19.99), UserTier::Free, None, 0, &config()).unwrap();

        assert_eq!(result.base_points, 19);
    }

    #[test]
    fn test_total_floors_after_multiplier() {
        // base 45 * 1.5 = 67.5 -> floor 67
        let result =
            PointsEngine::calculate(dec!(45), UserTier::Premium, None, 0, &config()).unwrap();

        assert_eq!(result.total_points, 67);
        assert_eq!(result.bonus_points, 22);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let result = PointsEngine::calculate(dec!(-1), UserTier::Free, None, 0, &config());
        assert!(matches!(result, Err(PointsError::NegativeAmount)));
    }

    #[test]
    fn test_zero_amount_is_zero_points() {
        let result =
            PointsEngine::calculate(dec!(0), UserTier::Premium, None, 0, &config()).unwrap();
        assert_eq!(result.total_points, 0);
        assert_eq!(result.awardable_points, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = PointsConfig {
            daily_cap: -1,
            ..config()
        };
        let result = PointsEngine::calculate(dec!(10), UserTier::Free, None, 0, &bad);
        assert!(matches!(result, Err(PointsError::InvalidConfig(_))));
    }

    #[test]
    fn test_retuned_base_rate() {
        // Operators can retune live; a 2x base rate doubles base points
        let retuned = PointsConfig {
            base_rate: dec!(2),
            ..config()
        };
        let result =
            PointsEngine::calculate(dec!(45.00), UserTier::Free, None, 0, &retuned).unwrap();
        assert_eq!(result.base_points, 90);
    }
}
