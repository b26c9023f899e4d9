//! Ledger repository for the append-only points ledger.
//!
//! The ledger is the sole source of truth for balances: every query
//! here reduces over signed deltas, and nothing ever updates or deletes
//! a row. Writers that need a ledger entry inside a larger transaction
//! use the `pub(crate)` helpers, which are generic over the connection.

use chrono::{DateTime, Days, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use dankpass_core::ledger::balance_of;

use crate::entities::{points_ledger, sea_orm_active_enums::LedgerEntryKind};

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A page of ledger history.
#[derive(Debug, Clone)]
pub struct LedgerPage {
    /// Entries, newest first.
    pub entries: Vec<points_ledger::Model>,
    /// Total entries for the user.
    pub total: u64,
}

/// Ledger repository for balance and history queries.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Current balance for a user: the sum of all their signed deltas.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn balance(&self, user_id: Uuid) -> Result<i64, LedgerError> {
        Ok(sum_deltas(&self.db, user_id).await?)
    }

    /// `Earned`-type points credited today (UTC calendar day).
    ///
    /// Bonus, redemption, and adjustment entries do not count toward the
    /// daily cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn earned_today(&self, user_id: Uuid) -> Result<i64, LedgerError> {
        Ok(earned_on_day(&self.db, user_id, Utc::now()).await?)
    }

    /// Paginated ledger history for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn history(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<LedgerPage, LedgerError> {
        let paginator = points_ledger::Entity::find()
            .filter(points_ledger::Column::UserId.eq(user_id))
            .order_by_desc(points_ledger::Column::CreatedAt)
            .paginate(&self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let entries = paginator.fetch_page(page).await?;

        Ok(LedgerPage { entries, total })
    }
}

/// Sums all signed deltas for a user on any connection.
pub(crate) async fn sum_deltas<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> Result<i64, DbErr> {
    let deltas: Vec<i64> = points_ledger::Entity::find()
        .filter(points_ledger::Column::UserId.eq(user_id))
        .select_only()
        .column(points_ledger::Column::Points)
        .into_tuple()
        .all(conn)
        .await?;
    Ok(balance_of(deltas))
}

/// Sums `Earned`-type credits within the UTC calendar day containing `at`.
pub(crate) async fn earned_on_day<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    at: DateTime<Utc>,
) -> Result<i64, DbErr> {
    let day_start = at.date_naive().and_time(NaiveTime::MIN).and_utc();
    let day_end = day_start
        .checked_add_days(Days::new(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let deltas: Vec<i64> = points_ledger::Entity::find()
        .filter(points_ledger::Column::UserId.eq(user_id))
        .filter(points_ledger::Column::Kind.eq(LedgerEntryKind::Earned))
        .filter(points_ledger::Column::CreatedAt.gte(day_start))
        .filter(points_ledger::Column::CreatedAt.lt(day_end))
        .select_only()
        .column(points_ledger::Column::Points)
        .into_tuple()
        .all(conn)
        .await?;
    Ok(balance_of(deltas))
}

/// Appends a ledger entry on any connection.
pub(crate) async fn insert_entry<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    receipt_id: Option<Uuid>,
    points: i64,
    kind: LedgerEntryKind,
    description: &str,
) -> Result<points_ledger::Model, DbErr> {
    points_ledger::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        receipt_id: Set(receipt_id),
        points: Set(points),
        kind: Set(kind),
        description: Set(description.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
}
