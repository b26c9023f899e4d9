//! `SeaORM` Entity for redemptions table.
//!
//! Each row pairs with exactly one negative ledger entry written in the
//! same transaction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::RedemptionStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "redemptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub perk_id: Uuid,
    /// Cost captured at redemption time; perk price edits do not rewrite history.
    pub points_spent: i64,
    pub status: RedemptionStatus,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::perks::Entity",
        from = "Column::PerkId",
        to = "super::perks::Column::Id"
    )]
    Perks,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::perks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Perks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
