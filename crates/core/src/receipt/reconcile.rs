//! Reconciliation of extracted receipt totals.
//!
//! Cross-checks the extracted subtotal/tax/total against the summed line
//! items and derives a confidence score. Receipts whose total cannot be
//! derived at all are rejected here, before any points math runs.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::extraction::ExtractedReceipt;

/// Tunable reconciliation policy.
///
/// Defaults preserve the production semantics: totals within 0.05 of
/// `subtotal + tax` score 0.95, anything further scores 0.75.
#[derive(Debug, Clone)]
pub struct ReconcilePolicy {
    /// Maximum |subtotal + tax - total| treated as consistent.
    pub tolerance: Decimal,
    /// Confidence when within tolerance.
    pub high_confidence: Decimal,
    /// Confidence when outside tolerance.
    pub low_confidence: Decimal,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            tolerance: Decimal::new(5, 2),
            high_confidence: Decimal::new(95, 2),
            low_confidence: Decimal::new(75, 2),
        }
    }
}

/// Reconciled totals derived from an extracted receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledTotals {
    /// Extracted subtotal, or the items sum when items exist, else None.
    pub subtotal: Option<Decimal>,
    /// Extracted tax, defaulting to zero.
    pub tax: Decimal,
    /// The derived total. Always known; underivable totals fail instead.
    pub total: Decimal,
    /// Sum of line totals, rounded to 2 decimals.
    pub items_sum: Decimal,
    /// |subtotal + tax - total| when subtotal is known, else zero.
    pub off_by: Decimal,
    /// Two-tier confidence score per the policy.
    pub confidence: Decimal,
}

/// Errors from reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Neither a total nor the pieces to derive one were extracted.
    #[error("Receipt total could not be determined from the extraction")]
    TotalUndetermined,
}

/// Reconciles an extracted receipt into consistent totals.
///
/// - `items_sum` treats missing line totals as zero and rounds to 2 dp.
/// - `subtotal` falls back to `items_sum` only when items exist.
/// - `tax` defaults to zero.
/// - `total` falls back to `subtotal + tax`; with no derivable total the
///   receipt cannot be processed.
///
/// # Errors
///
/// Returns `ReconcileError::TotalUndetermined` when no total can be
/// derived.
pub fn reconcile(
    extracted: &ExtractedReceipt,
    policy: &ReconcilePolicy,
) -> Result<ReconciledTotals, ReconcileError> {
    let items_sum: Decimal = extracted
        .items
        .iter()
        .map(|item| item.line_total.unwrap_or(Decimal::ZERO))
        .sum::<Decimal>()
        .round_dp(2);

    let subtotal = extracted.subtotal.or_else(|| {
        if extracted.items.is_empty() {
            None
        } else {
            Some(items_sum)
        }
    });

    let tax = extracted.tax.unwrap_or(Decimal::ZERO);

    let total = match (extracted.total, subtotal) {
        (Some(total), _) => total,
        (None, Some(subtotal)) => subtotal + tax,
        (None, None) => return Err(ReconcileError::TotalUndetermined),
    };

    let off_by = subtotal.map_or(Decimal::ZERO, |s| (s + tax - total).abs());

    let confidence = if off_by <= policy.tolerance {
        policy.high_confidence
    } else {
        policy.low_confidence
    };

    Ok(ReconciledTotals {
        subtotal,
        tax,
        total,
        items_sum,
        off_by,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ExtractedItem;
    use rust_decimal_macros::dec;

    fn item(line_total: Option<Decimal>) -> ExtractedItem {
        ExtractedItem {
            name: "item".to_string(),
            category: None,
            quantity: None,
            unit_price: None,
            line_total,
        }
    }

    fn extracted(
        subtotal: Option<Decimal>,
        tax: Option<Decimal>,
        total: Option<Decimal>,
        items: Vec<ExtractedItem>,
    ) -> ExtractedReceipt {
        ExtractedReceipt {
            merchant: None,
            purchase_date: None,
            subtotal,
            tax,
            total,
            items,
        }
    }

    #[test]
    fn test_consistent_receipt_high_confidence() {
        let input = extracted(Some(dec!(42.50)), Some(dec!(2.50)), Some(dec!(45.00)), vec![]);
        let result = reconcile(&input, &ReconcilePolicy::default()).unwrap();

        assert_eq!(result.total, dec!(45.00));
        assert_eq!(result.off_by, dec!(0));
        assert_eq!(result.confidence, dec!(0.95));
    }

    #[test]
    fn test_mismatch_low_confidence() {
        // subtotal 42.50, tax 0, total 45.00 -> off by 2.50 -> 0.75
        let input = extracted(Some(dec!(42.50)), Some(dec!(0)), Some(dec!(45.00)), vec![]);
        let result = reconcile(&input, &ReconcilePolicy::default()).unwrap();

        assert_eq!(result.off_by, dec!(2.50));
        assert_eq!(result.confidence, dec!(0.75));
    }

    #[test]
    fn test_off_by_exactly_tolerance_is_high() {
        let input = extracted(Some(dec!(44.95)), Some(dec!(0)), Some(dec!(45.00)), vec![]);
        let result = reconcile(&input, &ReconcilePolicy::default()).unwrap();

        assert_eq!(result.off_by, dec!(0.05));
        assert_eq!(result.confidence, dec!(0.95));
    }

    #[test]
    fn test_subtotal_falls_back_to_items_sum() {
        let items = vec![item(Some(dec!(10.00))), item(Some(dec!(5.50)))];
        let input = extracted(None, None, Some(dec!(15.50)), items);
        let result = reconcile(&input, &ReconcilePolicy::default()).unwrap();

        assert_eq!(result.items_sum, dec!(15.50));
        assert_eq!(result.subtotal, Some(dec!(15.50)));
        assert_eq!(result.off_by, dec!(0));
        assert_eq!(result.confidence, dec!(0.95));
    }

    #[test]
    fn test_missing_line_totals_count_as_zero() {
        let items = vec![item(Some(dec!(10.00))), item(None)];
        let input = extracted(None, None, Some(dec!(10.00)), items);
        let result = reconcile(&input, &ReconcilePolicy::default()).unwrap();

        assert_eq!(result.items_sum, dec!(10.00));
    }

    #[test]
    fn test_total_derived_from_subtotal_and_tax() {
        let input = extracted(Some(dec!(40.00)), Some(dec!(3.20)), None, vec![]);
        let result = reconcile(&input, &ReconcilePolicy::default()).unwrap();

        assert_eq!(result.total, dec!(43.20));
        assert_eq!(result.off_by, dec!(0));
    }

    #[test]
    fn test_no_items_means_no_subtotal_fallback() {
        let input = extracted(None, Some(dec!(1.00)), Some(dec!(12.00)), vec![]);
        let result = reconcile(&input, &ReconcilePolicy::default()).unwrap();

        assert_eq!(result.subtotal, None);
        // Unknown subtotal -> off_by 0 by definition
        assert_eq!(result.off_by, dec!(0));
        assert_eq!(result.confidence, dec!(0.95));
    }

    #[test]
    fn test_total_undetermined() {
        let input = extracted(None, Some(dec!(1.00)), None, vec![]);
        let result = reconcile(&input, &ReconcilePolicy::default());
        assert!(matches!(result, Err(ReconcileError::TotalUndetermined)));
    }

    #[test]
    fn test_tax_defaults_to_zero() {
        let input = extracted(Some(dec!(20.00)), None, None, vec![]);
        let result = reconcile(&input, &ReconcilePolicy::default()).unwrap();

        assert_eq!(result.tax, dec!(0));
        assert_eq!(result.total, dec!(20.00));
    }
}
