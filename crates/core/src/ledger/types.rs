//! Ledger entry types and balance folding.

use serde::{Deserialize, Serialize};

/// Classification of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryKind {
    /// Points earned from an approved receipt. Counts toward the daily cap.
    Earned,
    /// Bonus points (referrals, promotions). Not capped.
    Bonus,
    /// Points spent on a perk redemption. Always a negative delta.
    Redeemed,
    /// Manual admin adjustment, either sign.
    Adjustment,
}

impl LedgerEntryKind {
    /// Returns true for kinds that credit points to the user.
    #[must_use]
    pub fn is_credit(&self) -> bool {
        matches!(self, Self::Earned | Self::Bonus)
    }

    /// Returns true if entries of this kind count toward the daily
    /// earning cap.
    #[must_use]
    pub fn counts_toward_daily_cap(&self) -> bool {
        matches!(self, Self::Earned)
    }
}

/// Folds a sequence of signed point deltas into a balance.
///
/// This is the reference definition of a balance; the database layer
/// computes the same fold with `SUM(points)`.
#[must_use]
pub fn balance_of<I: IntoIterator<Item = i64>>(deltas: I) -> i64 {
    deltas.into_iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_credit_classification() {
        assert!(LedgerEntryKind::Earned.is_credit());
        assert!(LedgerEntryKind::Bonus.is_credit());
        assert!(!LedgerEntryKind::Redeemed.is_credit());
        assert!(!LedgerEntryKind::Adjustment.is_credit());
    }

    #[test]
    fn test_only_earned_counts_toward_cap() {
        assert!(LedgerEntryKind::Earned.counts_toward_daily_cap());
        assert!(!LedgerEntryKind::Bonus.counts_toward_daily_cap());
        assert!(!LedgerEntryKind::Redeemed.counts_toward_daily_cap());
    }

    #[test]
    fn test_balance_fold() {
        assert_eq!(balance_of([100, 250, -75]), 275);
        assert_eq!(balance_of([]), 0);
        assert_eq!(balance_of([-10, 10]), 0);
    }
}
