//! `SeaORM` Entity for users table.
//!
//! Identity/credentials live with the external identity provider; this
//! row carries the loyalty-side state only. There is deliberately no
//! cached balance column: balances are always summed from the ledger.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::UserTier;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub display_name: String,
    pub tier: UserTier,
    pub premium_expires_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(unique)]
    pub referral_code: Option<String>,
    pub referred_by_code: Option<String>,
    pub referral_count: i32,
    pub referral_points_earned: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::receipts::Entity")]
    Receipts,
    #[sea_orm(has_many = "super::points_ledger::Entity")]
    PointsLedger,
    #[sea_orm(has_many = "super::redemptions::Entity")]
    Redemptions,
}

impl Related<super::receipts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipts.def()
    }
}

impl Related<super::points_ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PointsLedger.def()
    }
}

impl Related<super::redemptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Redemptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
