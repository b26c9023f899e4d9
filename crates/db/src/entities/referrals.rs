//! `SeaORM` Entity for referrals table.
//!
//! Unique index on `referred_id` enforces that a user can be referred at
//! most once; `(referrer_id, referred_id)` guards against double
//! processing of the same pair.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ReferralStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub referrer_id: Uuid,
    pub referred_id: Uuid,
    pub code: String,
    pub referrer_points: i64,
    pub referred_points: i64,
    pub status: ReferralStatus,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReferrerId",
        to = "super::users::Column::Id"
    )]
    Referrer,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReferredId",
        to = "super::users::Column::Id"
    )]
    Referred,
}

impl ActiveModelBehavior for ActiveModel {}
