//! Postgres enum mappings.
//!
//! Each database enum mirrors a core domain enum; `From` impls keep the
//! two in lockstep so status strings never leak into business logic.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Membership tier (`user_tier`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_tier")]
#[serde(rename_all = "lowercase")]
pub enum UserTier {
    /// Free tier.
    #[sea_orm(string_value = "free")]
    Free,
    /// Premium tier.
    #[sea_orm(string_value = "premium")]
    Premium,
}

impl From<UserTier> for dankpass_core::UserTier {
    fn from(tier: UserTier) -> Self {
        match tier {
            UserTier::Free => Self::Free,
            UserTier::Premium => Self::Premium,
        }
    }
}

impl From<dankpass_core::UserTier> for UserTier {
    fn from(tier: dankpass_core::UserTier) -> Self {
        match tier {
            dankpass_core::UserTier::Free => Self::Free,
            dankpass_core::UserTier::Premium => Self::Premium,
        }
    }
}

/// Partner approval status (`partner_status`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "partner_status")]
#[serde(rename_all = "lowercase")]
pub enum PartnerStatus {
    /// Awaiting review.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved; in-network.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<PartnerStatus> for dankpass_core::PartnerStatus {
    fn from(status: PartnerStatus) -> Self {
        match status {
            PartnerStatus::Pending => Self::Pending,
            PartnerStatus::Approved => Self::Approved,
            PartnerStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<dankpass_core::PartnerStatus> for PartnerStatus {
    fn from(status: dankpass_core::PartnerStatus) -> Self {
        match status {
            dankpass_core::PartnerStatus::Pending => Self::Pending,
            dankpass_core::PartnerStatus::Approved => Self::Approved,
            dankpass_core::PartnerStatus::Rejected => Self::Rejected,
        }
    }
}

/// Receipt lifecycle status (`receipt_status`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "receipt_status")]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    /// Awaiting review.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved; points awarded.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<ReceiptStatus> for dankpass_core::receipt::ReceiptStatus {
    fn from(status: ReceiptStatus) -> Self {
        match status {
            ReceiptStatus::Pending => Self::Pending,
            ReceiptStatus::Approved => Self::Approved,
            ReceiptStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<dankpass_core::receipt::ReceiptStatus> for ReceiptStatus {
    fn from(status: dankpass_core::receipt::ReceiptStatus) -> Self {
        match status {
            dankpass_core::receipt::ReceiptStatus::Pending => Self::Pending,
            dankpass_core::receipt::ReceiptStatus::Approved => Self::Approved,
            dankpass_core::receipt::ReceiptStatus::Rejected => Self::Rejected,
        }
    }
}

/// Ledger entry classification (`ledger_entry_kind`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ledger_entry_kind")]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryKind {
    /// Earned from an approved receipt (counts toward the daily cap).
    #[sea_orm(string_value = "earned")]
    Earned,
    /// Bonus (referrals, promotions).
    #[sea_orm(string_value = "bonus")]
    Bonus,
    /// Spent on a redemption.
    #[sea_orm(string_value = "redeemed")]
    Redeemed,
    /// Manual admin adjustment.
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

impl From<LedgerEntryKind> for dankpass_core::ledger::LedgerEntryKind {
    fn from(kind: LedgerEntryKind) -> Self {
        match kind {
            LedgerEntryKind::Earned => Self::Earned,
            LedgerEntryKind::Bonus => Self::Bonus,
            LedgerEntryKind::Redeemed => Self::Redeemed,
            LedgerEntryKind::Adjustment => Self::Adjustment,
        }
    }
}

impl From<dankpass_core::ledger::LedgerEntryKind> for LedgerEntryKind {
    fn from(kind: dankpass_core::ledger::LedgerEntryKind) -> Self {
        match kind {
            dankpass_core::ledger::LedgerEntryKind::Earned => Self::Earned,
            dankpass_core::ledger::LedgerEntryKind::Bonus => Self::Bonus,
            dankpass_core::ledger::LedgerEntryKind::Redeemed => Self::Redeemed,
            dankpass_core::ledger::LedgerEntryKind::Adjustment => Self::Adjustment,
        }
    }
}

/// Redemption status (`redemption_status`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "redemption_status")]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    /// Created but not yet fulfilled.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Fulfilled.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Cancelled by an admin.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Referral status (`referral_status`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "referral_status")]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    /// Both sides rewarded.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Cancelled by an admin.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}
