//! Referral repository for code issuance and completion.
//!
//! Completion is guarded three ways: pure-rule validation up front, a
//! conditional update on `referred_by_code IS NULL`, and unique indexes
//! on `referred_id` and `(referrer_id, referred_id)` as the backstop.
//! Under any interleaving at most one completion lands per referred
//! user.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use dankpass_core::referral::{
    generate_code, is_valid_code, validate_completion, ReferralError,
    REFERRAL_BONUS_POINTS, REFERRAL_REWARD_POINTS,
};

use crate::entities::{
    referrals,
    sea_orm_active_enums::{LedgerEntryKind, ReferralStatus},
    users,
};
use crate::repositories::ledger;

/// How many times to retry code generation on a suffix collision.
const CODE_RETRIES: usize = 5;

/// Error types for referral operations.
#[derive(Debug, thiserror::Error)]
pub enum ReferralRepoError {
    /// User row is missing.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Completion rejected by referral rules.
    #[error(transparent)]
    Rule(#[from] ReferralError),

    /// Could not mint a unique code after several attempts.
    #[error("Could not generate a unique referral code")]
    CodeExhausted,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Outcome of a completed referral.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    /// Referral record.
    pub referral: referrals::Model,
    /// Points credited to the referrer.
    pub referrer_points: i64,
    /// Points credited to the referred user.
    pub referred_points: i64,
}

/// Referral repository for code and completion operations.
#[derive(Debug, Clone)]
pub struct ReferralRepository {
    db: DatabaseConnection,
}

impl ReferralRepository {
    /// Creates a new referral repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the user's referral code, minting one on first call.
    ///
    /// Minting uses a conditional update on `referral_code IS NULL`, so
    /// concurrent first calls converge on a single stored code; a
    /// suffix collision with another user's code retries with a fresh
    /// suffix.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is missing, generation exhausts its
    /// retries, or a query fails.
    pub async fn my_code(&self, user_id: Uuid) -> Result<String, ReferralRepoError> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(ReferralRepoError::UserNotFound(user_id))?;

        if let Some(code) = user.referral_code {
            return Ok(code);
        }

        for _ in 0..CODE_RETRIES {
            let candidate = generate_code(&user.display_name);

            let result = users::Entity::update_many()
                .col_expr(
                    users::Column::ReferralCode,
                    sea_orm::sea_query::Expr::value(candidate.clone()),
                )
                .col_expr(
                    users::Column::UpdatedAt,
                    sea_orm::sea_query::Expr::value(Utc::now()),
                )
                .filter(users::Column::Id.eq(user_id))
                .filter(users::Column::ReferralCode.is_null())
                .exec(&self.db)
                .await;

            match result {
                Ok(res) if res.rows_affected > 0 => return Ok(candidate),
                // Zero rows: a concurrent call won; return its code.
                Ok(_) => {
                    let refreshed = users::Entity::find_by_id(user_id)
                        .one(&self.db)
                        .await?
                        .ok_or(ReferralRepoError::UserNotFound(user_id))?;
                    if let Some(code) = refreshed.referral_code {
                        return Ok(code);
                    }
                }
                Err(err) => {
                    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                        continue;
                    }
                    return Err(err.into());
                }
            }
        }

        Err(ReferralRepoError::CodeExhausted)
    }

    /// Completes a referral: records the pair, marks the new user as
    /// referred, and credits both sides, all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is malformed or unknown, the new
    /// user is self-referring or already referred, the pair was already
    /// processed, or any write fails.
    pub async fn complete(
        &self,
        code: &str,
        new_user_id: Uuid,
    ) -> Result<CompletionOutcome, ReferralRepoError> {
        if !is_valid_code(code) {
            return Err(ReferralError::InvalidCodeFormat.into());
        }

        let txn = self.db.begin().await?;

        let referrer = users::Entity::find()
            .filter(users::Column::ReferralCode.eq(code))
            .one(&txn)
            .await?
            .ok_or(ReferralError::CodeNotFound)?;

        // Lock the new user's row; the referred-once check and the
        // referred_by_code write must be atomic against racing
        // completions for the same user.
        let new_user = users::Entity::find_by_id(new_user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ReferralRepoError::UserNotFound(new_user_id))?;

        let pair_exists = referrals::Entity::find()
            .filter(referrals::Column::ReferrerId.eq(referrer.id))
            .filter(referrals::Column::ReferredId.eq(new_user_id))
            .one(&txn)
            .await?
            .is_some();

        validate_completion(
            referrer.id,
            new_user_id,
            new_user.referred_by_code.as_deref(),
            pair_exists,
        )?;

        let marked = users::Entity::update_many()
            .col_expr(
                users::Column::ReferredByCode,
                sea_orm::sea_query::Expr::value(code.to_string()),
            )
            .col_expr(
                users::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(users::Column::Id.eq(new_user_id))
            .filter(users::Column::ReferredByCode.is_null())
            .exec(&txn)
            .await?;
        if marked.rows_affected == 0 {
            return Err(ReferralError::AlreadyReferred.into());
        }

        let inserted = referrals::ActiveModel {
            id: Set(Uuid::new_v4()),
            referrer_id: Set(referrer.id),
            referred_id: Set(new_user_id),
            code: Set(code.to_string()),
            referrer_points: Set(REFERRAL_REWARD_POINTS),
            referred_points: Set(REFERRAL_BONUS_POINTS),
            status: Set(ReferralStatus::Completed),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await;

        let referral = match inserted {
            Ok(model) => model,
            Err(err) => {
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(ReferralError::AlreadyProcessed.into());
                }
                return Err(err.into());
            }
        };

        ledger::insert_entry(
            &txn,
            referrer.id,
            None,
            REFERRAL_REWARD_POINTS,
            LedgerEntryKind::Bonus,
            &format!("Referral reward: {}", new_user.display_name),
        )
        .await?;
        ledger::insert_entry(
            &txn,
            new_user_id,
            None,
            REFERRAL_BONUS_POINTS,
            LedgerEntryKind::Bonus,
            "Welcome bonus for joining via referral",
        )
        .await?;

        let mut referrer_active: users::ActiveModel = referrer.clone().into();
        referrer_active.referral_count = Set(referrer.referral_count + 1);
        referrer_active.referral_points_earned =
            Set(referrer.referral_points_earned + REFERRAL_REWARD_POINTS);
        referrer_active.updated_at = Set(Utc::now().into());
        referrer_active.update(&txn).await?;

        txn.commit().await?;

        Ok(CompletionOutcome {
            referral,
            referrer_points: REFERRAL_REWARD_POINTS,
            referred_points: REFERRAL_BONUS_POINTS,
        })
    }

    /// Lists referrals made by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_referrer(
        &self,
        referrer_id: Uuid,
    ) -> Result<Vec<referrals::Model>, ReferralRepoError> {
        Ok(referrals::Entity::find()
            .filter(referrals::Column::ReferrerId.eq(referrer_id))
            .order_by_desc(referrals::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}
