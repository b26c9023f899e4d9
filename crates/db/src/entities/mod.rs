//! `SeaORM` entity definitions.

pub mod app_config;
pub mod partners;
pub mod perks;
pub mod points_ledger;
pub mod receipt_items;
pub mod receipts;
pub mod redemptions;
pub mod referrals;
pub mod sea_orm_active_enums;
pub mod users;
