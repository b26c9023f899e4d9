//! Repository layer for database operations.
//!
//! Each repository wraps a `DatabaseConnection` and owns the queries for
//! one aggregate. Multi-table workflows (receipt approval, redemption,
//! referral completion) run inside a single database transaction here so
//! callers never see partial state.

pub mod config;
pub mod ledger;
pub mod partner;
pub mod perk;
pub mod receipt;
pub mod referral;
pub mod user;

pub use config::{ConfigError, ConfigRepository};
pub use ledger::{LedgerError, LedgerRepository};
pub use partner::{PartnerError, PartnerRepository};
pub use perk::{PerkError, PerkRepository};
pub use receipt::{ReceiptRepoError, ReceiptRepository};
pub use referral::{ReferralRepoError, ReferralRepository};
pub use user::{UserError, UserRepository};
