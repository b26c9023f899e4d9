//! User repository for loyalty-side account state.
//!
//! Identity (passwords, OAuth) lives with the external identity
//! provider; rows here are provisioned on first authenticated request
//! and carry tier, referral state, and timestamps only.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums::UserTier, users};

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// User not found.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the query fails.
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<users::Model, UserError> {
        users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(UserError::NotFound(user_id))
    }

    /// Finds a user by referral code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_referral_code(
        &self,
        code: &str,
    ) -> Result<Option<users::Model>, UserError> {
        Ok(users::Entity::find()
            .filter(users::Column::ReferralCode.eq(code))
            .one(&self.db)
            .await?)
    }

    /// Ensures a row exists for an authenticated identity.
    ///
    /// Token subjects are provisioned lazily: the first request from a
    /// new identity creates a free-tier row; later requests return the
    /// existing one untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert or lookup fails.
    pub async fn upsert_from_identity(
        &self,
        user_id: Uuid,
        email: &str,
        display_name: &str,
    ) -> Result<users::Model, UserError> {
        if let Some(existing) = users::Entity::find_by_id(user_id).one(&self.db).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let inserted = users::ActiveModel {
            id: Set(user_id),
            email: Set(email.to_string()),
            display_name: Set(display_name.to_string()),
            tier: Set(UserTier::Free),
            premium_expires_at: Set(None),
            referral_code: Set(None),
            referred_by_code: Set(None),
            referral_count: Set(0),
            referral_points_earned: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(model) => Ok(model),
            // Lost a provisioning race; the winner's row is the answer.
            Err(DbErr::Exec(_) | DbErr::Query(_)) => self.find_by_id(user_id).await,
            Err(err) => Err(err.into()),
        }
    }

    /// Sets a user's tier, with an optional premium expiry.
    ///
    /// Driven by billing webhook events; downgrades clear the expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the update fails.
    pub async fn set_tier(
        &self,
        user_id: Uuid,
        tier: UserTier,
        premium_expires_at: Option<chrono::DateTime<Utc>>,
    ) -> Result<users::Model, UserError> {
        let user = self.find_by_id(user_id).await?;
        let mut active: users::ActiveModel = user.into();
        active.tier = Set(tier);
        active.premium_expires_at = Set(premium_expires_at.map(Into::into));
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }
}
