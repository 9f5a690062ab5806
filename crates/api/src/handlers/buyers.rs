//! Admin handlers for the `/buyers` resource.
//!
//! Every write invalidates the buyer's cached auction configuration.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use leadbid_core::auth_config::BuyerAuthConfig;
use leadbid_core::error::CoreError;
use leadbid_core::types::DbId;
use leadbid_core::webhook_signature::generate_webhook_secret;
use leadbid_db::models::buyer::{Buyer, BuyerFilter, BuyerReferences, CreateBuyer, UpdateBuyer};
use leadbid_db::models::page::Page;
use leadbid_db::repositories::BuyerRepo;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Inclusive bounds for buyer PING/POST timeouts, in seconds.
const MIN_TIMEOUT_SECS: i32 = 1;
const MAX_PING_TIMEOUT_SECS: i32 = 60;
const MAX_POST_TIMEOUT_SECS: i32 = 120;

/// A buyer together with its signing secret. Only returned on creation and
/// secret rotation.
#[derive(Debug, Serialize)]
pub struct BuyerWithSecret {
    #[serde(flatten)]
    pub buyer: Buyer,
    pub webhook_secret: String,
}

/// What `DELETE /buyers/{id}` did.
#[derive(Debug, Serialize)]
pub struct BuyerRemoval {
    pub id: DbId,
    /// `"deleted"` or `"deactivated"`.
    pub action: &'static str,
    pub references: BuyerReferences,
}

/// GET /api/v1/admin/buyers
pub async fn list_buyers(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(filter): Query<BuyerFilter>,
    Query(page): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = page.resolve();
    let items = BuyerRepo::list(&state.pool, &filter, limit, offset).await?;
    let total_count = BuyerRepo::count(&state.pool, &filter).await?;

    Ok(Json(DataResponse {
        data: Page {
            items,
            total_count,
            limit,
            offset,
        },
    }))
}

/// POST /api/v1/admin/buyers
pub async fn create_buyer(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(mut input): Json<CreateBuyer>,
) -> AppResult<impl IntoResponse> {
    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    validate_timeouts(input.ping_timeout_secs, input.post_timeout_secs)?;
    validate_auth_config(input.auth_config.as_ref())?;

    let secret = generate_webhook_secret();
    let buyer = BuyerRepo::create(&state.pool, &input, &secret).await?;

    tracing::info!(
        buyer_id = buyer.id,
        buyer_type = %buyer.buyer_type,
        subject = %admin.subject,
        "Buyer created",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: BuyerWithSecret {
                buyer,
                webhook_secret: secret,
            },
        }),
    ))
}

/// GET /api/v1/admin/buyers/{id}
pub async fn get_buyer(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let buyer = BuyerRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: buyer }))
}

/// PUT /api/v1/admin/buyers/{id}
pub async fn update_buyer(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBuyer>,
) -> AppResult<impl IntoResponse> {
    if input.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    validate_timeouts(input.ping_timeout_secs, input.post_timeout_secs)?;
    validate_auth_config(input.auth_config.as_ref())?;

    let buyer = BuyerRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    state.registry().invalidate_buyer(id).await;

    tracing::info!(buyer_id = id, subject = %admin.subject, "Buyer updated");

    Ok(Json(DataResponse { data: buyer }))
}

/// DELETE /api/v1/admin/buyers/{id}
///
/// Buyers still referenced by configs, zones, leads, or transactions are
/// deactivated instead of deleted.
pub async fn delete_buyer(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if BuyerRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(not_found(id));
    }

    let references = BuyerRepo::references(&state.pool, id).await?;
    let action = if references.is_referenced() {
        BuyerRepo::deactivate(&state.pool, id).await?;
        "deactivated"
    } else {
        BuyerRepo::delete(&state.pool, id).await?;
        "deleted"
    };
    state.registry().invalidate_buyer(id).await;

    tracing::info!(buyer_id = id, action, subject = %admin.subject, "Buyer removed");

    Ok(Json(DataResponse {
        data: BuyerRemoval {
            id,
            action,
            references,
        },
    }))
}

/// POST /api/v1/admin/buyers/{id}/rotate-secret
pub async fn rotate_secret(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let secret = generate_webhook_secret();
    let buyer = BuyerRepo::set_webhook_secret(&state.pool, id, &secret)
        .await?
        .ok_or_else(|| not_found(id))?;
    state.registry().invalidate_buyer(id).await;

    tracing::info!(buyer_id = id, subject = %admin.subject, "Buyer signing secret rotated");

    Ok(Json(DataResponse {
        data: BuyerWithSecret {
            buyer,
            webhook_secret: secret,
        },
    }))
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Buyer",
        id,
    })
}

fn validate_timeouts(ping: Option<i32>, post: Option<i32>) -> Result<(), CoreError> {
    let checks = [
        ("ping_timeout_secs", ping, MAX_PING_TIMEOUT_SECS),
        ("post_timeout_secs", post, MAX_POST_TIMEOUT_SECS),
    ];
    for (name, value, max) in checks {
        if let Some(v) = value {
            if !(MIN_TIMEOUT_SECS..=max).contains(&v) {
                return Err(CoreError::Validation(format!(
                    "{name} must be between {MIN_TIMEOUT_SECS} and {max} (got {v})"
                )));
            }
        }
    }
    Ok(())
}

fn validate_auth_config(auth_config: Option<&Value>) -> Result<(), CoreError> {
    if let Some(value) = auth_config {
        BuyerAuthConfig::from_json(value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn timeouts_are_bounded() {
        assert!(validate_timeouts(None, None).is_ok());
        assert!(validate_timeouts(Some(1), Some(120)).is_ok());
        assert!(validate_timeouts(Some(0), None).is_err());
        assert!(validate_timeouts(Some(61), None).is_err());
        assert!(validate_timeouts(None, Some(121)).is_err());
    }

    #[test]
    fn auth_config_shapes() {
        assert!(validate_auth_config(None).is_ok());
        assert!(validate_auth_config(Some(&json!({ "type": "bearer", "token": "t" }))).is_ok());
        assert!(validate_auth_config(Some(&json!({ "type": "oauth2" }))).is_err());
    }
}
