//! Handlers for consumer lead intake and the admin `/leads` resource.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use leadbid_core::compliance::{lead_quality_score, ComplianceTokens};
use leadbid_core::error::CoreError;
use leadbid_core::hashing::json_sha256;
use leadbid_core::status::{ComplianceEvent, LeadStatus};
use leadbid_core::types::DbId;
use leadbid_core::zip_code::normalize_zip_code;
use leadbid_db::models::compliance_audit::CreateComplianceAuditEntry;
use leadbid_db::models::lead::{CreateLead, Lead, LeadFilter};
use leadbid_db::models::page::Page;
use leadbid_db::models::transaction::Transaction;
use leadbid_db::repositories::{ComplianceAuditRepo, LeadRepo, ServiceTypeRepo, TransactionRepo};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::middleware::request_meta::RequestMeta;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /leads`: the completed consumer quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitLeadRequest {
    pub service_type_id: DbId,
    #[validate(length(min = 5, max = 10))]
    pub zip_code: String,
    pub form_data: Value,
    pub owns_home: Option<bool>,
    #[validate(length(max = 50))]
    pub timeframe: Option<String>,
    #[validate(length(max = 500))]
    pub trusted_form_cert_url: Option<String>,
    #[validate(length(max = 100))]
    pub trusted_form_cert_id: Option<String>,
    #[validate(length(max = 100))]
    pub jornaya_lead_id: Option<String>,
    pub compliance_data: Option<Value>,
    pub tcpa_consent: bool,
    #[validate(length(max = 2000))]
    pub tcpa_consent_text: Option<String>,
}

/// Response body for an accepted lead.
#[derive(Debug, Serialize)]
pub struct SubmittedLead {
    pub lead_id: DbId,
    pub status: LeadStatus,
    pub lead_quality_score: i32,
}

/// A lead with every outbound call made for it.
#[derive(Debug, Serialize)]
pub struct LeadDetail {
    #[serde(flatten)]
    pub lead: Lead,
    pub transactions: Vec<Transaction>,
}

// ---------------------------------------------------------------------------
// Consumer intake
// ---------------------------------------------------------------------------

/// POST /api/v1/leads
///
/// Validate and persist a PENDING lead. The auction dispatcher picks it up.
pub async fn submit_lead(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(input): Json<SubmitLeadRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    if !input.tcpa_consent {
        return Err(AppError::Core(CoreError::Validation(
            "TCPA consent is required".into(),
        )));
    }
    if !input.form_data.is_object() {
        return Err(AppError::Core(CoreError::Validation(
            "form_data must be a JSON object".into(),
        )));
    }
    let zip_code = normalize_zip_code(&input.zip_code)?;

    let service_type = ServiceTypeRepo::find_by_id(&state.pool, input.service_type_id)
        .await?
        .filter(|st| st.is_active)
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!(
                "Unknown or inactive service type {}",
                input.service_type_id
            )))
        })?;

    let compliance = ComplianceTokens {
        trusted_form_cert_url: input.trusted_form_cert_url,
        trusted_form_cert_id: input.trusted_form_cert_id,
        jornaya_lead_id: input.jornaya_lead_id,
    }
    .normalized()?;

    let score = lead_quality_score(
        &compliance,
        input.tcpa_consent,
        input.owns_home,
        &input.form_data,
    );

    let audit_data = json!({
        "service_type": service_type.name,
        "tcpa_consent": input.tcpa_consent,
        "tcpa_consent_text": input.tcpa_consent_text,
        "has_trusted_form": compliance.has_trusted_form(),
        "trusted_form_cert_id": compliance.trusted_form_cert_id,
        "has_jornaya": compliance.has_jornaya(),
        "jornaya_lead_id": compliance.jornaya_lead_id,
        "lead_quality_score": score,
        "form_data_sha256": json_sha256(&input.form_data),
    });

    let new_lead = CreateLead {
        service_type_id: service_type.id,
        form_data: input.form_data,
        zip_code,
        owns_home: input.owns_home,
        timeframe: input.timeframe.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        compliance,
        compliance_data: input.compliance_data,
        lead_quality_score: score,
        tcpa_consent: input.tcpa_consent,
        tcpa_consent_text: input.tcpa_consent_text,
    };

    let mut tx = state.pool.begin().await?;
    let lead = LeadRepo::create(&mut *tx, &new_lead).await?;
    ComplianceAuditRepo::append(
        &mut *tx,
        &CreateComplianceAuditEntry {
            lead_id: lead.id,
            event_type: ComplianceEvent::LeadSubmitted,
            event_data: audit_data,
            ip_address: meta.ip_address,
            user_agent: meta.user_agent,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        lead_id = lead.id,
        service_type_id = lead.service_type_id,
        zip_code = %lead.zip_code,
        lead_quality_score = score,
        "Lead submitted",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SubmittedLead {
                lead_id: lead.id,
                status: lead.lead_status(),
                lead_quality_score: score,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/leads
pub async fn list_leads(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(filter): Query<LeadFilter>,
    Query(page): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = page.resolve();
    let items = LeadRepo::list(&state.pool, &filter, limit, offset).await?;
    let total_count = LeadRepo::count(&state.pool, &filter).await?;

    Ok(Json(DataResponse {
        data: Page {
            items,
            total_count,
            limit,
            offset,
        },
    }))
}

/// GET /api/v1/admin/leads/{id}
///
/// The lead plus its PING/POST transactions.
pub async fn get_lead(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(lead_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let lead = find_lead(&state, lead_id).await?;
    let transactions = TransactionRepo::list_for_lead(&state.pool, lead_id).await?;

    Ok(Json(DataResponse {
        data: LeadDetail { lead, transactions },
    }))
}

/// POST /api/v1/admin/leads/{id}/auction
///
/// Run the auction for a PENDING lead now and return its result.
///
/// The auction runs on its own task, so a request that times out or is
/// dropped does not cut the auction short.
pub async fn run_auction(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(lead_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(lead_id, subject = %admin.subject, "Manual auction requested");

    let engine = Arc::clone(&state.auction);
    let result = tokio::spawn(async move { engine.run_for_lead_id(lead_id).await })
        .await
        .map_err(|e| AppError::InternalError(format!("Auction task failed: {e}")))??;

    Ok(Json(DataResponse { data: result }))
}

/// GET /api/v1/admin/leads/{id}/compliance-log
pub async fn compliance_log(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(lead_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_lead(&state, lead_id).await?;
    let entries = ComplianceAuditRepo::list_for_lead(&state.pool, lead_id).await?;

    Ok(Json(DataResponse { data: entries }))
}

async fn find_lead(state: &AppState, lead_id: DbId) -> AppResult<Lead> {
    LeadRepo::find_by_id(&state.pool, lead_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Lead",
            id: lead_id,
        }))
}
