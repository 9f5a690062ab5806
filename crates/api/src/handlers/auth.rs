//! Handler for the `/auth` resource (admin API key exchange).

use axum::extract::State;
use axum::Json;
use leadbid_core::error::CoreError;
use serde::{Deserialize, Serialize};

use crate::auth::api_key::api_key_matches;
use crate::auth::jwt::generate_access_token;
use crate::auth::ROLE_ADMIN;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Subject recorded on tokens issued by the key exchange.
const API_KEY_SUBJECT: &str = "admin-api-key";

/// Request body for `POST /auth/token`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub api_key: String,
}

/// Issued access token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// POST /api/v1/auth/token
///
/// Exchange the configured admin API key for an admin access token.
pub async fn issue_token(
    State(state): State<AppState>,
    Json(input): Json<TokenRequest>,
) -> AppResult<Json<DataResponse<TokenResponse>>> {
    let Some(expected) = state.config.admin_api_key.as_deref() else {
        tracing::warn!("Token requested but ADMIN_API_KEY is not configured");
        return Err(AppError::Core(CoreError::Unauthorized(
            "API key exchange is disabled".into(),
        )));
    };

    if !api_key_matches(&input.api_key, expected) {
        tracing::warn!("Rejected admin token request with invalid API key");
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid API key".into(),
        )));
    }

    let access_token = generate_access_token(API_KEY_SUBJECT, ROLE_ADMIN, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    tracing::info!("Issued admin access token");

    Ok(Json(DataResponse {
        data: TokenResponse {
            access_token,
            token_type: "Bearer",
            expires_in: state.config.jwt.access_token_expiry_mins * 60,
        },
    }))
}
