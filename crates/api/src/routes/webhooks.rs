//! Billing webhook route.
//!
//! The billing provider drives tier changes; DankPass never infers tier
//! from payment state on its own. Calls authenticate with a shared
//! secret header rather than a user token.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::AppState;
use dankpass_db::entities::sea_orm_active_enums::UserTier;
use dankpass_db::repositories::user::UserError;
use dankpass_db::UserRepository;

/// Header carrying the shared webhook secret.
pub const BILLING_SECRET_HEADER: &str = "x-billing-secret";

/// Creates the webhook routes (authenticated by shared secret, not JWT).
pub fn routes() -> Router<AppState> {
    Router::new().route("/webhooks/billing", post(billing_event))
}

/// Billing event payload.
#[derive(Debug, Deserialize)]
pub struct BillingEvent {
    /// Event name, e.g. `checkout.completed`.
    pub event: String,
    /// Affected user.
    pub user_id: uuid::Uuid,
    /// Tier carried by `subscription.updated` events.
    pub tier: Option<String>,
    /// Premium expiry, when the event grants premium.
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /webhooks/billing - Apply a subscription event to a user's tier.
async fn billing_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<BillingEvent>,
) -> impl IntoResponse {
    let presented = headers
        .get(BILLING_SECRET_HEADER)
        .and_then(|h| h.to_str().ok());
    if presented != Some(state.billing_webhook_secret.as_str()) {
        warn!("Billing webhook called with a bad or missing secret");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "invalid_secret",
                "message": "Invalid webhook secret"
            })),
        )
            .into_response();
    }

    let (tier, expires_at) = match payload.event.as_str() {
        "checkout.completed" => (UserTier::Premium, payload.expires_at),
        "subscription.updated" => match payload.tier.as_deref() {
            Some("premium") => (UserTier::Premium, payload.expires_at),
            Some("free") => (UserTier::Free, None),
            other => {
                warn!(tier = ?other, "subscription.updated with unknown tier");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_tier",
                        "message": "subscription.updated requires tier 'free' or 'premium'"
                    })),
                )
                    .into_response();
            }
        },
        "subscription.cancelled" => (UserTier::Free, None),
        other => {
            // Unknown events are acknowledged so the provider stops retrying.
            info!(event = %other, "Ignoring unhandled billing event");
            return (StatusCode::OK, Json(json!({ "handled": false }))).into_response();
        }
    };

    let repo = UserRepository::new((*state.db).clone());
    match repo.set_tier(payload.user_id, tier, expires_at).await {
        Ok(user) => {
            info!(user_id = %user.id, event = %payload.event, "Tier updated from billing event");
            (StatusCode::OK, Json(json!({ "handled": true }))).into_response()
        }
        Err(UserError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "user_not_found",
                "message": "No such user"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to apply billing event");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response()
        }
    }
}
