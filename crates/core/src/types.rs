//! Domain types shared across core modules.

use serde::{Deserialize, Serialize};

/// Membership tier of a user.
///
/// Tier is owned by the billing subsystem; the core only reads it when
/// picking point multipliers and gating premium-only perks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserTier {
    /// Free tier.
    Free,
    /// Paid premium tier with higher multipliers and exclusive perks.
    Premium,
}

impl UserTier {
    /// Returns true for the premium tier.
    #[must_use]
    pub fn is_premium(&self) -> bool {
        matches!(self, Self::Premium)
    }
}

/// Approval status of a partner business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerStatus {
    /// Application submitted, not yet reviewed.
    Pending,
    /// Approved by an admin; counts as in-network.
    Approved,
    /// Rejected by an admin.
    Rejected,
}

impl PartnerStatus {
    /// Only approved partners count as in-network for bonus multipliers.
    #[must_use]
    pub fn is_in_network(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_premium_check() {
        assert!(UserTier::Premium.is_premium());
        assert!(!UserTier::Free.is_premium());
    }

    #[test]
    fn test_partner_in_network() {
        assert!(PartnerStatus::Approved.is_in_network());
        assert!(!PartnerStatus::Pending.is_in_network());
        assert!(!PartnerStatus::Rejected.is_in_network());
    }
}
