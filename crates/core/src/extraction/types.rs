//! Canonical extraction result types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Structured fields extracted from a receipt image.
///
/// The model is instructed to never guess: any field it cannot read with
/// confidence comes back as `None` rather than an inferred value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedReceipt {
    /// Merchant name, if legible.
    pub merchant: Option<String>,
    /// Purchase date, if printed and legible.
    pub purchase_date: Option<NaiveDate>,
    /// Pre-tax subtotal.
    pub subtotal: Option<Decimal>,
    /// Tax amount.
    pub tax: Option<Decimal>,
    /// Grand total. Nullable on the wire but required to be present.
    pub total: Option<Decimal>,
    /// Line items; may be empty.
    pub items: Vec<ExtractedItem>,
}

/// A single extracted line item.
///
/// Informational only; points derive from the receipt total, never from
/// line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedItem {
    /// Item name as printed.
    pub name: String,
    /// Item category, when the model can classify it.
    pub category: Option<String>,
    /// Quantity purchased.
    pub quantity: Option<Decimal>,
    /// Unit price.
    pub unit_price: Option<Decimal>,
    /// Line total.
    pub line_total: Option<Decimal>,
}
