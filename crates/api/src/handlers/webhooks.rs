//! Inbound buyer callbacks.
//!
//! A buyer reports what happened to a lead it bought by POSTing a signed JSON
//! body. The `X-Webhook-Signature` header carries the hex HMAC-SHA256 of the
//! raw body under the buyer's signing secret, and the body carries a
//! `timestamp` checked against the replay window.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use leadbid_core::error::CoreError;
use leadbid_core::status::ComplianceEvent;
use leadbid_core::types::DbId;
use leadbid_core::webhook_signature::{check_webhook_signature_at, SIGNATURE_HEADER};
use leadbid_db::models::compliance_audit::CreateComplianceAuditEntry;
use leadbid_db::repositories::{BuyerRepo, ComplianceAuditRepo, LeadRepo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::middleware::request_meta::RequestMeta;
use crate::response::DataResponse;
use crate::state::AppState;

/// Parsed callback body. Fields beyond these are kept in the audit entry.
#[derive(Debug, Deserialize)]
pub struct LeadStatusCallback {
    pub lead_id: DbId,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct CallbackAccepted {
    pub lead_id: DbId,
    pub audit_id: DbId,
}

/// POST /api/v1/webhooks/buyers/{id}/lead-status
pub async fn lead_status(
    State(state): State<AppState>,
    Path(buyer_id): Path<DbId>,
    meta: RequestMeta,
    headers: HeaderMap,
    body: String,
) -> AppResult<impl IntoResponse> {
    let buyer = BuyerRepo::find_by_id(&state.pool, buyer_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Buyer",
            id: buyer_id,
        }))?;

    let Some(secret) = buyer.webhook_secret.as_deref() else {
        tracing::warn!(buyer_id, "Callback from buyer without a signing secret");
        return Err(unauthorized("Buyer has no signing secret"));
    };
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if let Err(e) = check_webhook_signature_at(
        &body,
        signature,
        secret,
        state.config.webhook_max_age_secs,
        Utc::now(),
    ) {
        tracing::warn!(buyer_id, error = %e, "Rejected buyer callback");
        return Err(unauthorized(&e.to_string()));
    }

    let event_data: Value = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?;
    let callback: LeadStatusCallback = serde_json::from_value(event_data.clone())
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let lead = LeadRepo::find_by_id(&state.pool, callback.lead_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Lead",
            id: callback.lead_id,
        }))?;
    if lead.winning_buyer_id != Some(buyer_id) {
        tracing::warn!(buyer_id, lead_id = lead.id, "Callback for a lead the buyer did not win");
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Buyer {buyer_id} did not purchase lead {}",
            lead.id
        ))));
    }

    let entry = ComplianceAuditRepo::append(
        &state.pool,
        &CreateComplianceAuditEntry {
            lead_id: lead.id,
            event_type: ComplianceEvent::BuyerFeedback,
            event_data,
            ip_address: meta.ip_address,
            user_agent: meta.user_agent,
        },
    )
    .await?;

    tracing::info!(
        buyer_id,
        lead_id = lead.id,
        status = %callback.status,
        "Buyer lead-status callback recorded",
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: CallbackAccepted {
                lead_id: lead.id,
                audit_id: entry.id,
            },
        }),
    ))
}

fn unauthorized(message: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(message.to_string()))
}
