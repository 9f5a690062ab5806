//! Admin handlers for buyer zip coverage ("service zones").

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use leadbid_core::bidding::validate_bid_range;
use leadbid_core::error::CoreError;
use leadbid_core::types::DbId;
use leadbid_core::zip_code::{normalize_zip_code, normalize_zip_codes};
use leadbid_db::models::page::Page;
use leadbid_db::models::service_zone::{
    BulkCreateServiceZones, CreateServiceZone, ServiceZone, ServiceZoneFilter, UpdateServiceZone,
};
use leadbid_db::repositories::{BuyerRepo, ServiceZoneRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DeletedZone {
    pub id: DbId,
    pub deleted: bool,
}

/// GET /api/v1/admin/service-zones
pub async fn list_zones(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(mut filter): Query<ServiceZoneFilter>,
    Query(page): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    // Zip filters match by prefix.
    filter.zip_code = filter
        .zip_code
        .map(|z| z.trim().to_string())
        .filter(|z| !z.is_empty());
    if filter
        .zip_code
        .as_deref()
        .is_some_and(|z| !z.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(AppError::Core(CoreError::Validation(
            "zip_code filter must be digits".into(),
        )));
    }
    let (limit, offset) = page.resolve();
    let items = ServiceZoneRepo::list(&state.pool, &filter, limit, offset).await?;
    let total_count = ServiceZoneRepo::count(&state.pool, &filter).await?;

    Ok(Json(DataResponse {
        data: Page {
            items,
            total_count,
            limit,
            offset,
        },
    }))
}

/// POST /api/v1/admin/service-zones
pub async fn create_zone(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(mut input): Json<CreateServiceZone>,
) -> AppResult<impl IntoResponse> {
    input.zip_code = normalize_zip_code(&input.zip_code)?;
    validate_overrides(input.max_leads_per_day, input.min_bid, input.max_bid)?;
    ensure_buyer_exists(&state, input.buyer_id).await?;

    let zone = ServiceZoneRepo::create(&state.pool, &input).await?;

    tracing::info!(
        zone_id = zone.id,
        buyer_id = zone.buyer_id,
        zip_code = %zone.zip_code,
        subject = %admin.subject,
        "Service zone created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: zone })))
}

/// POST /api/v1/admin/service-zones/bulk
///
/// Zips the buyer already covers for the service are reported as skipped.
pub async fn bulk_create_zones(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<BulkCreateServiceZones>,
) -> AppResult<impl IntoResponse> {
    let zip_codes = normalize_zip_codes(&input.zip_codes)?;
    validate_overrides(input.max_leads_per_day, input.min_bid, input.max_bid)?;
    ensure_buyer_exists(&state, input.buyer_id).await?;

    let result = ServiceZoneRepo::bulk_create(&state.pool, &input, &zip_codes).await?;

    tracing::info!(
        buyer_id = input.buyer_id,
        service_type_id = input.service_type_id,
        created = result.created.len(),
        skipped = result.skipped_zip_codes.len(),
        subject = %admin.subject,
        "Service zones bulk created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: result })))
}

/// GET /api/v1/admin/service-zones/{id}
pub async fn get_zone(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let zone = ServiceZoneRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: zone }))
}

/// PUT /api/v1/admin/service-zones/{id}
pub async fn update_zone(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateServiceZone>,
) -> AppResult<impl IntoResponse> {
    let existing: ServiceZone = ServiceZoneRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    validate_overrides(
        input.max_leads_per_day,
        input.min_bid.or(existing.min_bid),
        input.max_bid.or(existing.max_bid),
    )?;

    let zone = ServiceZoneRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(zone_id = id, subject = %admin.subject, "Service zone updated");

    Ok(Json(DataResponse { data: zone }))
}

/// DELETE /api/v1/admin/service-zones/{id}
pub async fn delete_zone(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = ServiceZoneRepo::delete(&state.pool, id).await?;
    if !deleted {
        return Err(not_found(id));
    }

    tracing::info!(zone_id = id, subject = %admin.subject, "Service zone deleted");

    Ok(Json(DataResponse {
        data: DeletedZone { id, deleted },
    }))
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "ServiceZone",
        id,
    })
}

async fn ensure_buyer_exists(state: &AppState, buyer_id: DbId) -> AppResult<()> {
    if BuyerRepo::find_by_id(&state.pool, buyer_id).await?.is_none() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown buyer {buyer_id}"
        ))));
    }
    Ok(())
}

/// Zone-level cap and price overrides.
fn validate_overrides(
    max_leads_per_day: Option<i32>,
    min_bid: Option<f64>,
    max_bid: Option<f64>,
) -> Result<(), CoreError> {
    if let Some(cap) = max_leads_per_day {
        if cap < 1 {
            return Err(CoreError::Validation(format!(
                "max_leads_per_day must be at least 1 (got {cap})"
            )));
        }
    }
    match (min_bid, max_bid) {
        (Some(min), Some(max)) => validate_bid_range(min, max),
        (Some(bid), None) | (None, Some(bid)) if !bid.is_finite() || bid < 0.0 => Err(
            CoreError::Validation(format!("Bid overrides must be non-negative (got {bid})")),
        ),
        _ => Ok(()),
    }
}
