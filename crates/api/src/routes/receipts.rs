//! Receipt upload and listing routes.
//!
//! Upload runs the whole intake pipeline inline: fetch the image,
//! fingerprint it, short-circuit on duplicates, extract with the vision
//! model, reconcile the totals, and persist a `Pending` receipt.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::{middleware::AuthUser, AppState};
use dankpass_core::extraction::ExtractionError;
use dankpass_core::receipt::{fingerprint, reconcile, ReconcilePolicy};
use dankpass_db::entities::{receipts, sea_orm_active_enums::ReceiptStatus};
use dankpass_db::repositories::receipt::{CreateReceiptInput, ReceiptRepoError};
use dankpass_db::{PartnerRepository, ReceiptRepository, UserRepository};

/// Creates the receipts router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/receipts", post(upload_receipt))
        .route("/receipts", get(list_receipts))
        .route("/receipts/{receipt_id}", get(get_receipt))
}

/// Request body for a receipt upload.
#[derive(Debug, Deserialize)]
pub struct UploadReceiptRequest {
    /// Location of the already-stored receipt image.
    pub image_url: String,
    /// Partner the purchase was made at, if claimed.
    pub partner_id: Option<uuid::Uuid>,
}

/// Query parameters for listing receipts.
#[derive(Debug, Deserialize)]
pub struct ListReceiptsQuery {
    /// Filter by status.
    pub status: Option<String>,
    /// Zero-based page.
    #[serde(default)]
    pub page: u64,
    /// Page size.
    pub per_page: Option<u64>,
}

/// Serializes a receipt for API responses.
pub(crate) fn receipt_json(receipt: &receipts::Model) -> serde_json::Value {
    json!({
        "id": receipt.id,
        "partner_id": receipt.partner_id,
        "image_url": receipt.image_url,
        "merchant": receipt.merchant,
        "purchase_date": receipt.purchase_date,
        "subtotal": receipt.subtotal,
        "tax": receipt.tax,
        "total": receipt.total,
        "items_sum": receipt.items_sum,
        "confidence": receipt.confidence,
        "status": receipt.status,
        "points_awarded": receipt.points_awarded,
        "created_at": receipt.created_at,
    })
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

fn extraction_unavailable() -> axum::response::Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "error": "extraction_unavailable",
            "message": "Receipt processing is temporarily unavailable, please try again"
        })),
    )
        .into_response()
}

/// Display name fallback for lazily provisioned users.
fn display_name_from_email(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// POST /receipts - Upload a receipt image for processing.
async fn upload_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UploadReceiptRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());
    let receipt_repo = ReceiptRepository::new((*state.db).clone());

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

    if let Some(partner_id) = payload.partner_id {
        let partner_repo = PartnerRepository::new((*state.db).clone());
        if partner_repo.find_by_id(partner_id).await.is_err() {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "partner_not_found",
                    "message": "The claimed partner does not exist"
                })),
            )
                .into_response();
        }
    }

    // Fingerprint the actual image bytes so re-uploads are caught even
    // when the URL differs.
    let image_bytes = match state.extraction.fetch_image(&payload.image_url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, url = %payload.image_url, "Failed to fetch receipt image");
            return extraction_unavailable();
        }
    };
    let image_sha256 = fingerprint(&image_bytes);

    match receipt_repo
        .find_duplicate(auth.user_id(), &image_sha256)
        .await
    {
        Ok(Some(existing)) => {
            info!(receipt_id = %existing.id, "Duplicate receipt upload");
            return (
                StatusCode::OK,
                Json(json!({
                    "duplicate": true,
                    "receipt": receipt_json(&existing)
                })),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Database error checking for duplicate");
            return internal_error();
        }
    }

    let mut extracted = match state.extraction.extract(&payload.image_url).await {
        Ok(extracted) => extracted,
        Err(ExtractionError::Validation(violations)) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "extraction_invalid",
                    "message": "The receipt could not be read reliably",
                    "violations": violations
                })),
            )
                .into_response();
        }
        Err(e) => {
            warn!(error = %e, retryable = e.is_retryable(), "Extraction failed");
            return extraction_unavailable();
        }
    };

    let totals = match reconcile(&extracted, &ReconcilePolicy::default()) {
        Ok(totals) => totals,
        Err(e) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "total_undetermined",
                    "message": e.to_string()
                })),
            )
                .into_response();
        }
    };

    // Persist the reconciled view, not the raw extraction.
    extracted.subtotal = totals.subtotal;
    extracted.tax = Some(totals.tax);
    extracted.total = Some(totals.total);

    let created = receipt_repo
        .create(CreateReceiptInput {
            user_id: auth.user_id(),
            partner_id: payload.partner_id,
            image_url: payload.image_url,
            image_sha256,
            extracted,
            items_sum: Some(totals.items_sum),
            confidence: Some(totals.confidence),
        })
        .await;

    match created {
        Ok(with_items) => {
            info!(
                receipt_id = %with_items.receipt.id,
                user_id = %auth.user_id(),
                confidence = %totals.confidence,
                off_by = %totals.off_by,
                "Receipt uploaded"
            );
            (
                StatusCode::CREATED,
                Json(json!({
                    "duplicate": false,
                    "receipt": receipt_json(&with_items.receipt)
                })),
            )
                .into_response()
        }
        // Lost the race with an identical concurrent upload.
        Err(ReceiptRepoError::Duplicate(existing_id)) => (
            StatusCode::OK,
            Json(json!({
                "duplicate": true,
                "receipt": { "id": existing_id }
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to persist receipt");
            internal_error()
        }
    }
}

/// GET /receipts - List the caller's receipts.
async fn list_receipts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListReceiptsQuery>,
) -> impl IntoResponse {
    let repo = ReceiptRepository::new((*state.db).clone());

    let status = match query.status.as_deref() {
        None => None,
        Some("pending") => Some(ReceiptStatus::Pending),
        Some("approved") => Some(ReceiptStatus::Approved),
        Some("rejected") => Some(ReceiptStatus::Rejected),
        Some(other) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_status",
                    "message": format!("Unknown status filter: {other}")
                })),
            )
                .into_response();
        }
    };

    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    match repo
        .list_for_user(auth.user_id(), status, query.page, per_page)
        .await
    {
        Ok(page) => (
            StatusCode::OK,
            Json(json!({
                "receipts": page.receipts.iter().map(receipt_json).collect::<Vec<_>>(),
                "total": page.total,
                "page": query.page,
                "per_page": per_page,
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list receipts");
            internal_error()
        }
    }
}

/// GET `/receipts/{receipt_id}` - Get one of the caller's receipts.
async fn get_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(receipt_id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = ReceiptRepository::new((*state.db).clone());

    match repo.find_by_id(receipt_id).await {
        // Ownership check: other users' receipts look like 404s.
        Ok(with_items) if with_items.receipt.user_id == auth.user_id() => {
            let mut body = receipt_json(&with_items.receipt);
            body["items"] = json!(with_items
                .items
                .iter()
                .map(|item| json!({
                    "name": item.name,
                    "category": item.category,
                    "quantity": item.quantity,
                    "unit_price": item.unit_price,
                    "line_total": item.line_total,
                }))
                .collect::<Vec<_>>());
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok(_) | Err(ReceiptRepoError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Receipt not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load receipt");
            internal_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_from_email() {
        assert_eq!(display_name_from_email("alice@example.com"), "alice");
        assert_eq!(display_name_from_email("no-at-sign"), "no-at-sign");
    }
}
