//! Admin routes: receipt review, perk and partner management, config.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::routes::perks::perk_json;
use crate::routes::receipts::receipt_json;
use crate::{middleware::AdminUser, AppState};
use dankpass_db::entities::sea_orm_active_enums::PartnerStatus;
use dankpass_db::repositories::config::ConfigError;
use dankpass_db::repositories::partner::PartnerError;
use dankpass_db::repositories::perk::{CreatePerkInput, PerkError, UpdatePerkInput};
use dankpass_db::repositories::receipt::ReceiptRepoError;
use dankpass_db::{
    ConfigRepository, PartnerRepository, PerkRepository, ReceiptRepository,
};

/// Creates the admin router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/receipts/pending", get(list_pending_receipts))
        .route("/admin/receipts/{receipt_id}/approve", post(approve_receipt))
        .route("/admin/receipts/{receipt_id}/reject", post(reject_receipt))
        .route("/admin/perks", post(create_perk))
        .route("/admin/perks", get(list_all_perks))
        .route("/admin/perks/{perk_id}", patch(update_perk))
        .route("/admin/partners", post(create_partner))
        .route("/admin/partners", get(list_partners))
        .route("/admin/partners/{partner_id}/status", patch(update_partner))
        .route("/admin/config", get(get_config))
        .route("/admin/config/{key}", put(set_config))
}

/// Request body for receipt review actions.
#[derive(Debug, Deserialize, Default)]
pub struct ReviewRequest {
    /// Reviewer notes stored on the receipt.
    pub notes: Option<String>,
}

/// Query parameters for the pending queue.
#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    /// Zero-based page.
    #[serde(default)]
    pub page: u64,
    /// Page size.
    pub per_page: Option<u64>,
}

/// GET /admin/receipts/pending - The review queue, oldest first.
async fn list_pending_receipts(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<PendingQuery>,
) -> impl IntoResponse {
    let repo = ReceiptRepository::new((*state.db).clone());
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    match repo.list_pending(query.page, per_page).await {
        Ok(page) => (
            StatusCode::OK,
            Json(json!({
                "receipts": page.receipts.iter().map(receipt_json).collect::<Vec<_>>(),
                "total": page.total,
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list pending receipts");
            internal_error()
        }
    }
}

fn review_error(e: ReceiptRepoError) -> axum::response::Response {
    match e {
        ReceiptRepoError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Receipt not found"
            })),
        )
            .into_response(),
        ReceiptRepoError::NotPending(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "already_reviewed",
                "message": "This receipt has already been reviewed"
            })),
        )
            .into_response(),
        ReceiptRepoError::TotalMissing(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "total_missing",
                "message": "The receipt has no total and cannot be approved"
            })),
        )
            .into_response(),
        e => {
            error!(error = %e, "Receipt review failed");
            internal_error()
        }
    }
}

/// POST `/admin/receipts/{receipt_id}/approve` - Approve and award points.
async fn approve_receipt(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(receipt_id): Path<uuid::Uuid>,
    payload: Option<Json<ReviewRequest>>,
) -> impl IntoResponse {
    let repo = ReceiptRepository::new((*state.db).clone());
    let config_repo = ConfigRepository::new((*state.db).clone());

    // Rates are read at approval time, so config edits apply to the
    // next approval without a restart.
    let config = match config_repo.points_config().await {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load points config");
            return internal_error();
        }
    };

    let notes = payload.and_then(|Json(body)| body.notes);
    match repo.approve(receipt_id, notes.as_deref(), &config).await {
        Ok(outcome) => {
            info!(
                receipt_id = %receipt_id,
                admin_id = %admin.user_id(),
                awarded = outcome.breakdown.awardable_points,
                capped = outcome.breakdown.awardable_points < outcome.breakdown.total_points,
                "Receipt approved"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "receipt": receipt_json(&outcome.receipt),
                    "breakdown": {
                        "base_points": outcome.breakdown.base_points,
                        "multiplier": outcome.breakdown.multiplier,
                        "bonus_points": outcome.breakdown.bonus_points,
                        "total_points": outcome.breakdown.total_points,
                        "awarded_points": outcome.breakdown.awardable_points,
                        "daily_cap_reached": outcome.breakdown.daily_cap_reached,
                    }
                })),
            )
                .into_response()
        }
        Err(e) => review_error(e),
    }
}

/// POST `/admin/receipts/{receipt_id}/reject` - Reject without awarding.
async fn reject_receipt(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(receipt_id): Path<uuid::Uuid>,
    payload: Option<Json<ReviewRequest>>,
) -> impl IntoResponse {
    let repo = ReceiptRepository::new((*state.db).clone());

    let notes = payload.and_then(|Json(body)| body.notes);
    match repo.reject(receipt_id, notes.as_deref()).await {
        Ok(receipt) => {
            info!(receipt_id = %receipt_id, admin_id = %admin.user_id(), "Receipt rejected");
            (StatusCode::OK, Json(json!({ "receipt": receipt_json(&receipt) }))).into_response()
        }
        Err(e) => review_error(e),
    }
}

/// Request body for creating a perk.
#[derive(Debug, Deserialize)]
pub struct CreatePerkRequest {
    /// Display title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Cost in points.
    pub points_cost: i64,
    /// Premium gate.
    #[serde(default)]
    pub is_premium_only: bool,
    /// Active flag; defaults to true.
    pub is_active: Option<bool>,
}

/// Request body for updating a perk.
#[derive(Debug, Deserialize, Default)]
pub struct UpdatePerkRequest {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New cost.
    pub points_cost: Option<i64>,
    /// New premium gate.
    pub is_premium_only: Option<bool>,
    /// Activate or retire.
    pub is_active: Option<bool>,
}

/// POST /admin/perks - Create a perk.
async fn create_perk(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<CreatePerkRequest>,
) -> impl IntoResponse {
    let repo = PerkRepository::new((*state.db).clone());
    let input = CreatePerkInput {
        title: payload.title,
        description: payload.description,
        points_cost: payload.points_cost,
        is_premium_only: payload.is_premium_only,
        is_active: payload.is_active.unwrap_or(true),
    };

    match repo.create(input).await {
        Ok(perk) => (StatusCode::CREATED, Json(perk_json(&perk))).into_response(),
        Err(PerkError::Redemption(e)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_cost", "message": e.to_string() })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create perk");
            internal_error()
        }
    }
}

/// GET /admin/perks - List all perks including retired ones.
async fn list_all_perks(State(state): State<AppState>, _admin: AdminUser) -> impl IntoResponse {
    let repo = PerkRepository::new((*state.db).clone());
    match repo.list_all().await {
        Ok(perks) => (
            StatusCode::OK,
            Json(json!({ "perks": perks.iter().map(perk_json).collect::<Vec<_>>() })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list perks");
            internal_error()
        }
    }
}

/// PATCH `/admin/perks/{perk_id}` - Partially update a perk.
async fn update_perk(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(perk_id): Path<uuid::Uuid>,
    Json(payload): Json<UpdatePerkRequest>,
) -> impl IntoResponse {
    let repo = PerkRepository::new((*state.db).clone());
    let input = UpdatePerkInput {
        title: payload.title,
        description: payload.description.map(Some),
        points_cost: payload.points_cost,
        is_premium_only: payload.is_premium_only,
        is_active: payload.is_active,
    };

    match repo.update(perk_id, input).await {
        Ok(perk) => (StatusCode::OK, Json(perk_json(&perk))).into_response(),
        Err(PerkError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not_found", "message": "Perk not found" })),
        )
            .into_response(),
        Err(PerkError::Redemption(e)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_cost", "message": e.to_string() })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update perk");
            internal_error()
        }
    }
}

/// Request body for registering a partner.
#[derive(Debug, Deserialize)]
pub struct CreatePartnerRequest {
    /// Merchant name.
    pub name: String,
}

/// Request body for updating a partner's status.
#[derive(Debug, Deserialize)]
pub struct UpdatePartnerRequest {
    /// New status: pending, approved, or rejected.
    pub status: String,
}

fn partner_json(partner: &dankpass_db::entities::partners::Model) -> serde_json::Value {
    json!({
        "id": partner.id,
        "name": partner.name,
        "status": partner.status,
        "created_at": partner.created_at,
    })
}

/// POST /admin/partners - Register a partner (starts pending).
async fn create_partner(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<CreatePartnerRequest>,
) -> impl IntoResponse {
    let repo = PartnerRepository::new((*state.db).clone());
    match repo.create(&payload.name).await {
        Ok(partner) => (StatusCode::CREATED, Json(partner_json(&partner))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create partner");
            internal_error()
        }
    }
}

/// GET /admin/partners - List all partners.
async fn list_partners(State(state): State<AppState>, _admin: AdminUser) -> impl IntoResponse {
    let repo = PartnerRepository::new((*state.db).clone());
    match repo.list().await {
        Ok(partners) => (
            StatusCode::OK,
            Json(json!({ "partners": partners.iter().map(partner_json).collect::<Vec<_>>() })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list partners");
            internal_error()
        }
    }
}

/// PATCH `/admin/partners/{partner_id}` - Change a partner's network status.
async fn update_partner(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(partner_id): Path<uuid::Uuid>,
    Json(payload): Json<UpdatePartnerRequest>,
) -> impl IntoResponse {
    let status = match payload.status.as_str() {
        "pending" => PartnerStatus::Pending,
        "approved" => PartnerStatus::Approved,
        "rejected" => PartnerStatus::Rejected,
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_status",
                    "message": format!("Unknown partner status: {other}")
                })),
            )
                .into_response();
        }
    };

    let repo = PartnerRepository::new((*state.db).clone());
    match repo.set_status(partner_id, status).await {
        Ok(partner) => {
            info!(partner_id = %partner_id, admin_id = %admin.user_id(), status = %payload.status, "Partner status updated");
            (StatusCode::OK, Json(partner_json(&partner))).into_response()
        }
        Err(PartnerError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not_found", "message": "Partner not found" })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update partner");
            internal_error()
        }
    }
}

/// Request body for setting a config value.
#[derive(Debug, Deserialize)]
pub struct SetConfigRequest {
    /// New value.
    pub value: String,
}

/// GET /admin/config - List all tunable settings.
async fn get_config(State(state): State<AppState>, _admin: AdminUser) -> impl IntoResponse {
    let repo = ConfigRepository::new((*state.db).clone());
    match repo.list().await {
        Ok(rows) => (
            StatusCode::OK,
            Json(json!({
                "config": rows.iter().map(|row| json!({
                    "key": row.key,
                    "value": row.value,
                    "updated_at": row.updated_at,
                })).collect::<Vec<_>>()
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list config");
            internal_error()
        }
    }
}

/// PUT `/admin/config/{key}` - Upsert one tunable setting.
async fn set_config(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(key): Path<String>,
    Json(payload): Json<SetConfigRequest>,
) -> impl IntoResponse {
    let repo = ConfigRepository::new((*state.db).clone());
    match repo.set(&key, &payload.value).await {
        Ok(row) => {
            info!(key = %row.key, value = %row.value, admin_id = %admin.user_id(), "Config updated");
            (
                StatusCode::OK,
                Json(json!({ "key": row.key, "value": row.value })),
            )
                .into_response()
        }
        Err(e @ (ConfigError::UnknownKey(_) | ConfigError::InvalidValue { .. })) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_config", "message": e.to_string() })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update config");
            internal_error()
        }
    }
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred"
        })),
    )
        .into_response()
}
