//! API route definitions.

use axum::{middleware, Router};

use crate::{middleware::auth::auth_middleware, AppState};

pub mod admin;
pub mod health;
pub mod perks;
pub mod points;
pub mod receipts;
pub mod referrals;
pub mod webhooks;

/// Creates the authenticated API router (health and webhooks mount at the root).
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(receipts::routes())
        .merge(points::routes())
        .merge(perks::routes())
        .merge(referrals::routes())
        .merge(admin::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
}
