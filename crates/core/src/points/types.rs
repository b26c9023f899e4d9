//! Points engine types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Operator-tunable points configuration.
///
/// Loaded fresh from the `app_config` store at the start of each
/// calculation so operators can retune live. Never bake these values into
/// the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsConfig {
    /// Points earned per currency unit spent (`POINTS_BASE`).
    pub base_rate: Decimal,
    /// Multiplier applied for premium-tier users (`POINTS_PREMIUM`).
    pub premium_multiplier: Decimal,
    /// Multiplier applied for in-network partners (`POINTS_INNETWORK`).
    pub in_network_multiplier: Decimal,
    /// Maximum `earned`-type points per user per UTC calendar day
    /// (`DAILY_CAP`).
    pub daily_cap: i64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            base_rate: Decimal::ONE,
            premium_multiplier: Decimal::new(15, 1),
            in_network_multiplier: Decimal::TWO,
            daily_cap: 2000,
        }
    }
}

/// Result of a points calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointsBreakdown {
    /// `floor(amount * base_rate)`.
    pub base_points: i64,
    /// The multiplier that was applied.
    pub multiplier: Decimal,
    /// `total_points - base_points`.
    pub bonus_points: i64,
    /// `floor(base_points * multiplier)`, before cap truncation.
    pub total_points: i64,
    /// Points actually awardable after daily-cap truncation.
    pub awardable_points: i64,
    /// Whether the user is on the premium tier.
    pub is_premium: bool,
    /// Whether the purchase was at an approved partner.
    pub is_in_network: bool,
    /// Whether the pre-award daily total already met the cap.
    pub daily_cap_reached: bool,
}
