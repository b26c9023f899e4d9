//! Points balance and ledger history routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::{middleware::AuthUser, AppState};
use dankpass_db::{ConfigRepository, LedgerRepository};

/// Creates the points router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/points/balance", get(get_balance))
        .route("/points/history", get(get_history))
}

/// Query parameters for ledger history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Zero-based page.
    #[serde(default)]
    pub page: u64,
    /// Page size.
    pub per_page: Option<u64>,
}

/// GET /points/balance - Current balance and today's earning headroom.
async fn get_balance(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let ledger = LedgerRepository::new((*state.db).clone());
    let config_repo = ConfigRepository::new((*state.db).clone());

    let balance = match ledger.balance(auth.user_id()).await {
        Ok(balance) => balance,
        Err(e) => {
            error!(error = %e, "Failed to compute balance");
            return internal_error();
        }
    };
    let earned_today = match ledger.earned_today(auth.user_id()).await {
        Ok(earned) => earned,
        Err(e) => {
            error!(error = %e, "Failed to compute today's earnings");
            return internal_error();
        }
    };
    let config = match config_repo.points_config().await {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load points config");
            return internal_error();
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "balance": balance,
            "earned_today": earned_today,
            "daily_cap": config.daily_cap,
        })),
    )
        .into_response()
}

/// GET /points/history - Paginated ledger entries, newest first.
async fn get_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let ledger = LedgerRepository::new((*state.db).clone());
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    match ledger.history(auth.user_id(), query.page, per_page).await {
        Ok(page) => (
            StatusCode::OK,
            Json(json!({
                "entries": page.entries.iter().map(|entry| json!({
                    "id": entry.id,
                    "points": entry.points,
                    "kind": entry.kind,
                    "description": entry.description,
                    "receipt_id": entry.receipt_id,
                    "created_at": entry.created_at,
                })).collect::<Vec<_>>(),
                "total": page.total,
                "page": query.page,
                "per_page": per_page,
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load ledger history");
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
