//! Admin handlers for buyer service configurations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use leadbid_core::bidding::validate_bid_range;
use leadbid_core::error::CoreError;
use leadbid_core::templates::{validate_field_mappings, validate_template};
use leadbid_core::types::DbId;
use leadbid_db::models::buyer_service_config::{
    BuyerServiceConfig, CreateBuyerServiceConfig, UpdateBuyerServiceConfig,
};
use leadbid_db::repositories::{BuyerRepo, BuyerServiceConfigRepo, ServiceTypeRepo};
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DeletedConfig {
    pub id: DbId,
    pub deleted: bool,
}

/// GET /api/v1/admin/buyers/{id}/service-configs
pub async fn list_for_buyer(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(buyer_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_buyer_exists(&state, buyer_id).await?;
    let configs = BuyerServiceConfigRepo::list_for_buyer(&state.pool, buyer_id).await?;
    Ok(Json(DataResponse { data: configs }))
}

/// POST /api/v1/admin/buyers/{id}/service-configs
pub async fn create_config(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(buyer_id): Path<DbId>,
    Json(input): Json<CreateBuyerServiceConfig>,
) -> AppResult<impl IntoResponse> {
    ensure_buyer_exists(&state, buyer_id).await?;
    if ServiceTypeRepo::find_by_id(&state.pool, input.service_type_id)
        .await?
        .is_none()
    {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown service type {}",
            input.service_type_id
        ))));
    }

    validate_bid_range(input.min_bid, input.max_bid)?;
    validate_payload_shapes(
        input.ping_template.as_ref(),
        input.post_template.as_ref(),
        input.field_mappings.as_ref(),
    )?;

    let config = BuyerServiceConfigRepo::create(&state.pool, buyer_id, &input).await?;
    state.registry().invalidate_buyer(buyer_id).await;

    tracing::info!(
        config_id = config.id,
        buyer_id,
        service_type_id = config.service_type_id,
        subject = %admin.subject,
        "Service configuration created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: config })))
}

/// GET /api/v1/admin/service-configs/{id}
pub async fn get_config(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let config = find_config(&state, id).await?;
    Ok(Json(DataResponse { data: config }))
}

/// PUT /api/v1/admin/service-configs/{id}
pub async fn update_config(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBuyerServiceConfig>,
) -> AppResult<impl IntoResponse> {
    let existing = find_config(&state, id).await?;

    // The range is checked as it will be after the partial update.
    validate_bid_range(
        input.min_bid.unwrap_or(existing.min_bid),
        input.max_bid.unwrap_or(existing.max_bid),
    )?;
    validate_payload_shapes(
        input.ping_template.as_ref(),
        input.post_template.as_ref(),
        input.field_mappings.as_ref(),
    )?;

    let config = BuyerServiceConfigRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::ConfigNotFound(id))?;
    state.registry().invalidate_buyer(config.buyer_id).await;

    tracing::info!(config_id = id, buyer_id = config.buyer_id, subject = %admin.subject, "Service configuration updated");

    Ok(Json(DataResponse { data: config }))
}

/// DELETE /api/v1/admin/service-configs/{id}
///
/// Refused while the buyer still has zip coverage for the config's service.
pub async fn delete_config(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let config = find_config(&state, id).await?;

    let deleted = BuyerServiceConfigRepo::delete_if_no_zip_codes(&state.pool, id).await?;
    if !deleted {
        let zip_codes = BuyerServiceConfigRepo::count_zip_codes(&state.pool, &config).await?;
        if zip_codes > 0 {
            return Err(AppError::ConfigHasZipCodes {
                config_id: id,
                zip_codes,
            });
        }
        return Err(AppError::ConfigNotFound(id));
    }
    state.registry().invalidate_buyer(config.buyer_id).await;

    tracing::info!(config_id = id, buyer_id = config.buyer_id, subject = %admin.subject, "Service configuration deleted");

    Ok(Json(DataResponse {
        data: DeletedConfig { id, deleted },
    }))
}

async fn find_config(state: &AppState, id: DbId) -> AppResult<BuyerServiceConfig> {
    BuyerServiceConfigRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::ConfigNotFound(id))
}

async fn ensure_buyer_exists(state: &AppState, buyer_id: DbId) -> AppResult<()> {
    match BuyerRepo::find_by_id(&state.pool, buyer_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Core(CoreError::NotFound {
            entity: "Buyer",
            id: buyer_id,
        })),
    }
}

fn validate_payload_shapes(
    ping_template: Option<&Value>,
    post_template: Option<&Value>,
    field_mappings: Option<&Value>,
) -> Result<(), CoreError> {
    if let Some(t) = ping_template {
        validate_template(t)?;
    }
    if let Some(t) = post_template {
        validate_template(t)?;
    }
    if let Some(m) = field_mappings {
        validate_field_mappings(m)?;
    }
    Ok(())
}
