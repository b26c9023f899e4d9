//! Referral code and completion routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{middleware::AuthUser, AppState};
use dankpass_core::referral::ReferralError;
use dankpass_db::repositories::referral::ReferralRepoError;
use dankpass_db::{ReferralRepository, UserRepository};

/// Creates the referrals router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/referrals/code", get(my_code))
        .route("/referrals/complete", post(complete_referral))
        .route("/referrals", get(list_referrals))
}

/// Request body for completing a referral.
#[derive(Debug, Deserialize)]
pub struct CompleteReferralRequest {
    /// The referrer's code the new user signed up with.
    pub code: String,
}

fn display_name_from_email(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// GET /referrals/code - The caller's referral code, minted on first call.
async fn my_code(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());
    let repo = ReferralRepository::new((*state.db).clone());

    if let Err(e) = user_repo
        .upsert_from_identity(
            auth.user_id(),
            auth.email(),
            display_name_from_email(auth.email()),
        )
        .await
    {
        error!(error = %e, "Failed to provision user");
        return internal_error();
    }

    match repo.my_code(auth.user_id()).await {
        Ok(code) => (StatusCode::OK, Json(json!({ "code": code }))).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to issue referral code");
            internal_error()
        }
    }
}

/// POST /referrals/complete - Credit a referral for the calling new user.
async fn complete_referral(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CompleteReferralRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());
    let repo = ReferralRepository::new((*state.db).clone());

    if let Err(e) = user_repo
        .upsert_from_identity(
            auth.user_id(),
            auth.email(),
            display_name_from_email(auth.email()),
        )
        .await
    {
        error!(error = %e, "Failed to provision user");
        return internal_error();
    }

    match repo.complete(&payload.code, auth.user_id()).await {
        Ok(outcome) => {
            info!(
                referral_id = %outcome.referral.id,
                referred_id = %auth.user_id(),
                "Referral completed"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "referral_id": outcome.referral.id,
                    "referrer_points": outcome.referrer_points,
                    "referred_points": outcome.referred_points,
                })),
            )
                .into_response()
        }
        Err(ReferralRepoError::Rule(e)) => {
            let (status, code) = match &e {
                ReferralError::InvalidCodeFormat => (StatusCode::BAD_REQUEST, "invalid_code"),
                ReferralError::CodeNotFound => (StatusCode::NOT_FOUND, "code_not_found"),
                ReferralError::SelfReferral => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "self_referral")
                }
                ReferralError::AlreadyReferred => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "already_referred")
                }
                ReferralError::AlreadyProcessed => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "already_processed")
                }
            };
            (
                status,
                Json(json!({ "error": code, "message": e.to_string() })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to complete referral");
            internal_error()
        }
    }
}

/// GET /referrals - Referrals the caller has made.
async fn list_referrals(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = ReferralRepository::new((*state.db).clone());
    match repo.list_for_referrer(auth.user_id()).await {
        Ok(referrals) => (
            StatusCode::OK,
            Json(json!({
                "referrals": referrals.iter().map(|r| json!({
                    "id": r.id,
                    "referred_id": r.referred_id,
                    "referrer_points": r.referrer_points,
                    "status": r.status,
                    "created_at": r.created_at,
                })).collect::<Vec<_>>()
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list referrals");
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
