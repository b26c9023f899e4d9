//! Partner repository for merchant network management.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{partners, sea_orm_active_enums::PartnerStatus};

/// Error types for partner operations.
#[derive(Debug, thiserror::Error)]
pub enum PartnerError {
    /// Partner not found.
    #[error("Partner not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Partner repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct PartnerRepository {
    db: DatabaseConnection,
}

impl PartnerRepository {
    /// Creates a new partner repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a new partner in `Pending` status.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, name: &str) -> Result<partners::Model, PartnerError> {
        let now = Utc::now();
        Ok(partners::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            status: Set(PartnerStatus::Pending),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?)
    }

    /// Finds a partner by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the partner does not exist or the query fails.
    pub async fn find_by_id(&self, partner_id: Uuid) -> Result<partners::Model, PartnerError> {
        partners::Entity::find_by_id(partner_id)
            .one(&self.db)
            .await?
            .ok_or(PartnerError::NotFound(partner_id))
    }

    /// Sets a partner's network status.
    ///
    /// Status changes affect future approvals only; receipts already
    /// approved keep the points they were awarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the partner does not exist or the update fails.
    pub async fn set_status(
        &self,
        partner_id: Uuid,
        status: PartnerStatus,
    ) -> Result<partners::Model, PartnerError> {
        let partner = self.find_by_id(partner_id).await?;
        let mut active: partners::ActiveModel = partner.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Lists all partners, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<partners::Model>, PartnerError> {
        Ok(partners::Entity::find()
            .order_by_desc(partners::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}
