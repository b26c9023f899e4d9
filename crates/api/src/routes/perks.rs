//! Perk catalog and redemption routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{error, info};

use crate::{middleware::AuthUser, AppState};
use dankpass_core::perk::RedemptionError;
use dankpass_db::entities::perks;
use dankpass_db::repositories::perk::PerkError;
use dankpass_db::{PerkRepository, UserRepository};

/// Creates the perks router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/perks", get(list_perks))
        .route("/perks/{perk_id}/redeem", post(redeem_perk))
        .route("/redemptions", get(list_redemptions))
}

pub(crate) fn perk_json(perk: &perks::Model) -> serde_json::Value {
    json!({
        "id": perk.id,
        "title": perk.title,
        "description": perk.description,
        "points_cost": perk.points_cost,
        "is_premium_only": perk.is_premium_only,
        "is_active": perk.is_active,
    })
}

/// GET /perks - List active perks, cheapest first.
async fn list_perks(State(state): State<AppState>) -> impl IntoResponse {
    let repo = PerkRepository::new((*state.db).clone());
    match repo.list_active().await {
        Ok(perks) => (
            StatusCode::OK,
            Json(json!({
                "perks": perks.iter().map(perk_json).collect::<Vec<_>>()
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list perks");
            internal_error()
        }
    }
}

/// POST `/perks/{perk_id}/redeem` - Redeem a perk for the caller.
async fn redeem_perk(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(perk_id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());
    let repo = PerkRepository::new((*state.db).clone());

    if let Err(e) = user_repo
        .upsert_from_identity(auth.user_id(), auth.email(), auth.email())
        .await
    {
        error!(error = %e, "Failed to provision user");
        return internal_error();
    }

    match repo.redeem(auth.user_id(), perk_id).await {
        Ok(outcome) => {
            info!(
                user_id = %auth.user_id(),
                perk_id = %perk_id,
                points_spent = outcome.redemption.points_spent,
                "Perk redeemed"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "redemption_id": outcome.redemption.id,
                    "points_spent": outcome.redemption.points_spent,
                    "balance": outcome.balance_after,
                })),
            )
                .into_response()
        }
        Err(PerkError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Perk not found"
            })),
        )
            .into_response(),
        Err(PerkError::Redemption(e)) => {
            let code = match &e {
                RedemptionError::NotAvailable => "perk_not_available",
                RedemptionError::InsufficientPoints { .. } => "insufficient_points",
                RedemptionError::PremiumRequired => "premium_required",
                RedemptionError::InvalidCost => "invalid_cost",
            };
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": code,
                    "message": e.to_string()
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to redeem perk");
            internal_error()
        }
    }
}

/// GET /redemptions - The caller's redemption history.
async fn list_redemptions(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = PerkRepository::new((*state.db).clone());
    match repo.redemptions_for_user(auth.user_id()).await {
        Ok(redemptions) => (
            StatusCode::OK,
            Json(json!({
                "redemptions": redemptions.iter().map(|r| json!({
                    "id": r.id,
                    "perk_id": r.perk_id,
                    "points_spent": r.points_spent,
                    "status": r.status,
                    "created_at": r.created_at,
                })).collect::<Vec<_>>()
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list redemptions");
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
