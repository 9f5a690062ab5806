//! Handlers for service types: the public quiz catalog and admin CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use leadbid_core::error::CoreError;
use leadbid_core::types::DbId;
use leadbid_db::models::service_type::{CreateServiceType, UpdateServiceType};
use leadbid_db::repositories::ServiceTypeRepo;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/service-types
///
/// Active service types with their form schemas.
pub async fn list_active(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let types = ServiceTypeRepo::list(&state.pool, true).await?;
    Ok(Json(DataResponse { data: types }))
}

/// GET /api/v1/admin/service-types
///
/// Every service type, including deactivated ones.
pub async fn list_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let types = ServiceTypeRepo::list(&state.pool, false).await?;
    Ok(Json(DataResponse { data: types }))
}

/// POST /api/v1/admin/service-types
pub async fn create_service_type(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(mut input): Json<CreateServiceType>,
) -> AppResult<impl IntoResponse> {
    input.name = input.name.trim().to_ascii_lowercase();
    input.display_name = input.display_name.trim().to_string();
    validate_name(&input.name)?;
    if input.display_name.is_empty() {
        return Err(AppError::BadRequest("display_name must not be empty".into()));
    }
    validate_form_schema(input.form_schema.as_ref())?;

    let service_type = ServiceTypeRepo::create(&state.pool, &input).await?;

    tracing::info!(
        service_type_id = service_type.id,
        name = %service_type.name,
        subject = %admin.subject,
        "Service type created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: service_type })))
}

/// PUT /api/v1/admin/service-types/{id}
pub async fn update_service_type(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateServiceType>,
) -> AppResult<impl IntoResponse> {
    if input
        .display_name
        .as_deref()
        .is_some_and(|n| n.trim().is_empty())
    {
        return Err(AppError::BadRequest("display_name must not be empty".into()));
    }
    validate_form_schema(input.form_schema.as_ref())?;

    let service_type = ServiceTypeRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ServiceType",
            id,
        }))?;

    tracing::info!(service_type_id = id, subject = %admin.subject, "Service type updated");

    Ok(Json(DataResponse { data: service_type }))
}

/// Names are lowercase slugs (`roofing`, `hvac_repair`).
fn validate_name(name: &str) -> Result<(), CoreError> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid service type name '{name}': use lowercase letters, digits, '_' or '-'"
        )))
    }
}

fn validate_form_schema(schema: Option<&Value>) -> Result<(), CoreError> {
    match schema {
        None | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(CoreError::Validation(
            "form_schema must be a JSON object".into(),
        )),
    }
}
