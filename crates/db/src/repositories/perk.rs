//! Perk repository for the catalog and redemption flow.
//!
//! Redemption is a check-then-debit: the user row is locked exclusively
//! before the balance is summed, so two concurrent redemptions for the
//! same user serialize and the second sees the post-debit balance.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use dankpass_core::perk::{check_redeemable, PerkInfo, RedemptionError};

use crate::entities::{
    perks, redemptions,
    sea_orm_active_enums::{LedgerEntryKind, RedemptionStatus},
    users,
};
use crate::repositories::ledger;

/// Error types for perk operations.
#[derive(Debug, thiserror::Error)]
pub enum PerkError {
    /// Perk not found.
    #[error("Perk not found: {0}")]
    NotFound(Uuid),

    /// User row is missing.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Redemption rejected by eligibility rules.
    #[error(transparent)]
    Redemption(#[from] RedemptionError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a perk.
#[derive(Debug, Clone)]
pub struct CreatePerkInput {
    /// Display title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Cost in points; must be positive.
    pub points_cost: i64,
    /// Whether redemption requires the premium tier.
    pub is_premium_only: bool,
    /// Whether the perk is redeemable.
    pub is_active: bool,
}

/// Partial update for a perk; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdatePerkInput {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New cost.
    pub points_cost: Option<i64>,
    /// New premium gate.
    pub is_premium_only: Option<bool>,
    /// Activate or retire.
    pub is_active: Option<bool>,
}

/// Outcome of a successful redemption.
#[derive(Debug, Clone)]
pub struct RedemptionOutcome {
    /// Redemption record.
    pub redemption: redemptions::Model,
    /// Balance after the debit.
    pub balance_after: i64,
}

/// Perk repository for catalog and redemption operations.
#[derive(Debug, Clone)]
pub struct PerkRepository {
    db: DatabaseConnection,
}

impl PerkRepository {
    /// Creates a new perk repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a perk.
    ///
    /// # Errors
    ///
    /// Returns an error if the cost is not positive or the insert fails.
    pub async fn create(&self, input: CreatePerkInput) -> Result<perks::Model, PerkError> {
        if input.points_cost <= 0 {
            return Err(RedemptionError::InvalidCost.into());
        }

        let now = Utc::now();
        Ok(perks::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            description: Set(input.description),
            points_cost: Set(input.points_cost),
            is_premium_only: Set(input.is_premium_only),
            is_active: Set(input.is_active),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?)
    }

    /// Applies a partial update to a perk.
    ///
    /// # Errors
    ///
    /// Returns an error if the perk does not exist, a new cost is not
    /// positive, or the update fails.
    pub async fn update(
        &self,
        perk_id: Uuid,
        input: UpdatePerkInput,
    ) -> Result<perks::Model, PerkError> {
        if matches!(input.points_cost, Some(cost) if cost <= 0) {
            return Err(RedemptionError::InvalidCost.into());
        }

        let perk = self.find_by_id(perk_id).await?;
        let mut active: perks::ActiveModel = perk.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(cost) = input.points_cost {
            active.points_cost = Set(cost);
        }
        if let Some(premium_only) = input.is_premium_only {
            active.is_premium_only = Set(premium_only);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Finds a perk by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the perk does not exist or the query fails.
    pub async fn find_by_id(&self, perk_id: Uuid) -> Result<perks::Model, PerkError> {
        perks::Entity::find_by_id(perk_id)
            .one(&self.db)
            .await?
            .ok_or(PerkError::NotFound(perk_id))
    }

    /// Lists active perks, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_active(&self) -> Result<Vec<perks::Model>, PerkError> {
        Ok(perks::Entity::find()
            .filter(perks::Column::IsActive.eq(true))
            .order_by_asc(perks::Column::PointsCost)
            .all(&self.db)
            .await?)
    }

    /// Lists all perks including retired ones (admin view).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_all(&self) -> Result<Vec<perks::Model>, PerkError> {
        Ok(perks::Entity::find()
            .order_by_desc(perks::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Redeems a perk for a user: eligibility check, ledger debit, and
    /// redemption record in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the perk or user is missing, eligibility
    /// fails, or any write fails.
    pub async fn redeem(
        &self,
        user_id: Uuid,
        perk_id: Uuid,
    ) -> Result<RedemptionOutcome, PerkError> {
        let txn = self.db.begin().await?;

        let perk = perks::Entity::find_by_id(perk_id)
            .one(&txn)
            .await?
            .ok_or(PerkError::NotFound(perk_id))?;

        // Lock before reading the balance; the debit below must be
        // applied against a balance no concurrent writer can change.
        let user = users::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(PerkError::UserNotFound(user_id))?;

        let balance = ledger::sum_deltas(&txn, user_id).await?;
        let info = PerkInfo {
            id: perk.id,
            title: perk.title.clone(),
            points_cost: perk.points_cost,
            is_premium_only: perk.is_premium_only,
            is_active: perk.is_active,
        };
        check_redeemable(&info, user.tier.into(), balance)?;

        let description = format!("Redeemed perk: {}", perk.title);
        ledger::insert_entry(
            &txn,
            user_id,
            None,
            -perk.points_cost,
            LedgerEntryKind::Redeemed,
            &description,
        )
        .await?;

        let redemption = redemptions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            perk_id: Set(perk_id),
            points_spent: Set(perk.points_cost),
            status: Set(RedemptionStatus::Completed),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(RedemptionOutcome {
            redemption,
            balance_after: balance - perk.points_cost,
        })
    }

    /// Lists a user's redemptions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn redemptions_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<redemptions::Model>, PerkError> {
        Ok(redemptions::Entity::find()
            .filter(redemptions::Column::UserId.eq(user_id))
            .order_by_desc(redemptions::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}
