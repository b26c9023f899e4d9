//! Receipt repository for upload, dedup, and the review lifecycle.
//!
//! Approval is the money path: the whole check-then-award sequence runs
//! in one database transaction holding an exclusive lock on the user
//! row, so the daily cap is enforced exactly even under concurrent
//! approvals. The status flip is a conditional update filtered on
//! `Pending`; whichever admin commits second sees zero rows affected
//! and gets an error instead of a second award.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use dankpass_core::{
    extraction::{ExtractedItem, ExtractedReceipt},
    points::{PointsBreakdown, PointsConfig, PointsEngine, PointsError},
    receipt::ReceiptStatus as DomainStatus,
};

use crate::entities::{
    partners, points_ledger, receipt_items, receipts,
    sea_orm_active_enums::{LedgerEntryKind, ReceiptStatus},
    users,
};
use crate::repositories::ledger;

/// Error types for receipt operations.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptRepoError {
    /// Receipt not found.
    #[error("Receipt not found: {0}")]
    NotFound(Uuid),

    /// Receipt is not in `Pending` status.
    #[error("Receipt {0} has already been reviewed")]
    NotPending(Uuid),

    /// Receipt has no reconciled total; it cannot be approved.
    #[error("Receipt {0} has no total and cannot be approved")]
    TotalMissing(Uuid),

    /// Same user already uploaded an identical image.
    #[error("Duplicate upload: receipt {0} already exists for this image")]
    Duplicate(Uuid),

    /// Owning user row is missing.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Points calculation rejected the inputs.
    #[error("Points calculation failed: {0}")]
    Points(#[from] PointsError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for persisting an uploaded receipt.
#[derive(Debug, Clone)]
pub struct CreateReceiptInput {
    /// Uploading user.
    pub user_id: Uuid,
    /// Claimed partner, if any.
    pub partner_id: Option<Uuid>,
    /// Stored image location.
    pub image_url: String,
    /// Lowercase hex SHA-256 of the image bytes.
    pub image_sha256: String,
    /// Extraction output.
    pub extracted: ExtractedReceipt,
    /// Reconciled items sum.
    pub items_sum: Option<Decimal>,
    /// Reconciliation confidence.
    pub confidence: Option<Decimal>,
}

/// Outcome of an approval: the updated receipt plus the award math.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    /// Receipt after the status flip.
    pub receipt: receipts::Model,
    /// Points breakdown that was applied.
    pub breakdown: PointsBreakdown,
}

/// A receipt with its line items.
#[derive(Debug, Clone)]
pub struct ReceiptWithItems {
    /// Receipt header.
    pub receipt: receipts::Model,
    /// Line items.
    pub items: Vec<receipt_items::Model>,
}

/// A page of receipts.
#[derive(Debug, Clone)]
pub struct ReceiptPage {
    /// Receipts, newest first.
    pub receipts: Vec<receipts::Model>,
    /// Total receipts matching the filter.
    pub total: u64,
}

/// Receipt repository for CRUD and lifecycle operations.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    db: DatabaseConnection,
}

impl ReceiptRepository {
    /// Creates a new receipt repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Looks up an existing upload of the same image by the same user.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_duplicate(
        &self,
        user_id: Uuid,
        image_sha256: &str,
    ) -> Result<Option<receipts::Model>, ReceiptRepoError> {
        Ok(receipts::Entity::find()
            .filter(receipts::Column::UserId.eq(user_id))
            .filter(receipts::Column::ImageSha256.eq(image_sha256))
            .one(&self.db)
            .await?)
    }

    /// Persists an uploaded receipt in `Pending` status with its items.
    ///
    /// The `(user_id, image_sha256)` unique index backs the dedup
    /// check, so a racing duplicate insert surfaces as
    /// [`ReceiptRepoError::Duplicate`] rather than a second row.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload is a duplicate or the insert
    /// fails.
    pub async fn create(
        &self,
        input: CreateReceiptInput,
    ) -> Result<ReceiptWithItems, ReceiptRepoError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let inserted = receipts::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            partner_id: Set(input.partner_id),
            image_url: Set(input.image_url.clone()),
            image_sha256: Set(input.image_sha256.clone()),
            merchant: Set(input.extracted.merchant.clone()),
            purchase_date: Set(input.extracted.purchase_date),
            subtotal: Set(input.extracted.subtotal),
            tax: Set(input.extracted.tax),
            total: Set(input.extracted.total),
            items_sum: Set(input.items_sum),
            confidence: Set(input.confidence),
            status: Set(ReceiptStatus::Pending),
            points_awarded: Set(0),
            admin_notes: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await;

        let receipt = match inserted {
            Ok(model) => model,
            Err(err) => {
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    txn.rollback().await?;
                    let existing = self
                        .find_duplicate(input.user_id, &input.image_sha256)
                        .await?;
                    return match existing {
                        Some(model) => Err(ReceiptRepoError::Duplicate(model.id)),
                        None => Err(err.into()),
                    };
                }
                return Err(err.into());
            }
        };

        let items = insert_items(&txn, receipt.id, &input.extracted.items).await?;
        txn.commit().await?;

        Ok(ReceiptWithItems { receipt, items })
    }

    /// Approves a pending receipt and awards points atomically.
    ///
    /// Inside one transaction: lock the user row, re-read the receipt,
    /// compute the award against today's cap headroom, flip the status
    /// with a `Pending`-filtered conditional update, and append the
    /// ledger entry. A second concurrent approval of the same receipt
    /// fails on the conditional update and awards nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt is missing, already reviewed,
    /// has no total, or any write fails.
    pub async fn approve(
        &self,
        receipt_id: Uuid,
        admin_notes: Option<&str>,
        config: &PointsConfig,
    ) -> Result<ApprovalOutcome, ReceiptRepoError> {
        let txn = self.db.begin().await?;

        let receipt = receipts::Entity::find_by_id(receipt_id)
            .one(&txn)
            .await?
            .ok_or(ReceiptRepoError::NotFound(receipt_id))?;

        let current = DomainStatus::from(receipt.status.clone());
        if !current.can_transition_to(DomainStatus::Approved) {
            return Err(ReceiptRepoError::NotPending(receipt_id));
        }
        let total = receipt
            .total
            .ok_or(ReceiptRepoError::TotalMissing(receipt_id))?;

        // Exclusive lock on the user row serializes cap accounting with
        // other approvals and with redemptions for the same user.
        let user = users::Entity::find_by_id(receipt.user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ReceiptRepoError::UserNotFound(receipt.user_id))?;

        let partner_status = match receipt.partner_id {
            Some(partner_id) => partners::Entity::find_by_id(partner_id)
                .one(&txn)
                .await?
                .map(|p| p.status.into()),
            None => None,
        };

        let earned_today = ledger::earned_on_day(&txn, user.id, Utc::now()).await?;
        let breakdown = PointsEngine::calculate(
            total,
            user.tier.clone().into(),
            partner_status,
            earned_today,
            config,
        )?;

        let result = receipts::Entity::update_many()
            .col_expr(
                receipts::Column::Status,
                sea_orm::sea_query::Expr::value(ReceiptStatus::Approved),
            )
            .col_expr(
                receipts::Column::PointsAwarded,
                sea_orm::sea_query::Expr::value(breakdown.awardable_points),
            )
            .col_expr(
                receipts::Column::AdminNotes,
                sea_orm::sea_query::Expr::value(admin_notes.map(ToString::to_string)),
            )
            .col_expr(
                receipts::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(receipts::Column::Id.eq(receipt_id))
            .filter(receipts::Column::Status.eq(ReceiptStatus::Pending))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ReceiptRepoError::NotPending(receipt_id));
        }

        if breakdown.awardable_points > 0 {
            let description = format!(
                "Receipt approved ({})",
                receipt.merchant.as_deref().unwrap_or("unknown merchant")
            );
            ledger::insert_entry(
                &txn,
                user.id,
                Some(receipt_id),
                breakdown.awardable_points,
                LedgerEntryKind::Earned,
                &description,
            )
            .await?;
        }

        txn.commit().await?;

        let updated = receipts::Entity::find_by_id(receipt_id)
            .one(&self.db)
            .await?
            .ok_or(ReceiptRepoError::NotFound(receipt_id))?;

        Ok(ApprovalOutcome {
            receipt: updated,
            breakdown,
        })
    }

    /// Rejects a pending receipt. No points move.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt is missing, already reviewed, or
    /// the update fails.
    pub async fn reject(
        &self,
        receipt_id: Uuid,
        admin_notes: Option<&str>,
    ) -> Result<receipts::Model, ReceiptRepoError> {
        let result = receipts::Entity::update_many()
            .col_expr(
                receipts::Column::Status,
                sea_orm::sea_query::Expr::value(ReceiptStatus::Rejected),
            )
            .col_expr(
                receipts::Column::AdminNotes,
                sea_orm::sea_query::Expr::value(admin_notes.map(ToString::to_string)),
            )
            .col_expr(
                receipts::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(receipts::Column::Id.eq(receipt_id))
            .filter(receipts::Column::Status.eq(ReceiptStatus::Pending))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            let existing = receipts::Entity::find_by_id(receipt_id)
                .one(&self.db)
                .await?;
            return match existing {
                Some(_) => Err(ReceiptRepoError::NotPending(receipt_id)),
                None => Err(ReceiptRepoError::NotFound(receipt_id)),
            };
        }

        receipts::Entity::find_by_id(receipt_id)
            .one(&self.db)
            .await?
            .ok_or(ReceiptRepoError::NotFound(receipt_id))
    }

    /// Finds a receipt with its items.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt does not exist or the query fails.
    pub async fn find_by_id(&self, receipt_id: Uuid) -> Result<ReceiptWithItems, ReceiptRepoError> {
        let receipt = receipts::Entity::find_by_id(receipt_id)
            .one(&self.db)
            .await?
            .ok_or(ReceiptRepoError::NotFound(receipt_id))?;

        let items = receipt_items::Entity::find()
            .filter(receipt_items::Column::ReceiptId.eq(receipt_id))
            .order_by_asc(receipt_items::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(ReceiptWithItems { receipt, items })
    }

    /// Lists a user's receipts, newest first, optionally filtered by
    /// status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<ReceiptStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<ReceiptPage, ReceiptRepoError> {
        let mut query = receipts::Entity::find().filter(receipts::Column::UserId.eq(user_id));
        if let Some(status) = status {
            query = query.filter(receipts::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(receipts::Column::CreatedAt)
            .paginate(&self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let receipts = paginator.fetch_page(page).await?;

        Ok(ReceiptPage { receipts, total })
    }

    /// Lists pending receipts across all users for the review queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_pending(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<ReceiptPage, ReceiptRepoError> {
        let paginator = receipts::Entity::find()
            .filter(receipts::Column::Status.eq(ReceiptStatus::Pending))
            .order_by_asc(receipts::Column::CreatedAt)
            .paginate(&self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let receipts = paginator.fetch_page(page).await?;

        Ok(ReceiptPage { receipts, total })
    }

    /// Ledger entries attached to a receipt (used by tests and audits).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn ledger_entries(
        &self,
        receipt_id: Uuid,
    ) -> Result<Vec<points_ledger::Model>, ReceiptRepoError> {
        Ok(points_ledger::Entity::find()
            .filter(points_ledger::Column::ReceiptId.eq(receipt_id))
            .all(&self.db)
            .await?)
    }
}

async fn insert_items<C: sea_orm::ConnectionTrait>(
    conn: &C,
    receipt_id: Uuid,
    items: &[ExtractedItem],
) -> Result<Vec<receipt_items::Model>, DbErr> {
    let mut models = Vec::with_capacity(items.len());
    for item in items {
        let model = receipt_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            receipt_id: Set(receipt_id),
            name: Set(item.name.clone()),
            category: Set(item.category.clone()),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            line_total: Set(item.line_total),
            created_at: Set(Utc::now().into()),
        }
        .insert(conn)
        .await?;
        models.push(model);
    }
    Ok(models)
}
