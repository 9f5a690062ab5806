//! Contractor self-signup.
//!
//! A signup creates an inactive CONTRACTOR buyer with one service config per
//! selected service type and zip coverage for every selected zip. An admin
//! activates the buyer after review.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use leadbid_core::bidding::validate_bid_range;
use leadbid_core::error::CoreError;
use leadbid_core::status::BuyerType;
use leadbid_core::types::DbId;
use leadbid_core::webhook_signature::generate_webhook_secret;
use leadbid_core::zip_code::normalize_zip_codes;
use leadbid_db::models::buyer::CreateBuyer;
use leadbid_db::models::buyer_service_config::CreateBuyerServiceConfig;
use leadbid_db::repositories::{BuyerRepo, ServiceTypeRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Default per-lead price window for self-signup contractors.
const DEFAULT_SIGNUP_MIN_BID: f64 = 5.0;
const DEFAULT_SIGNUP_MAX_BID: f64 = 100.0;

/// Zone priority given to signup coverage.
const DEFAULT_SIGNUP_PRIORITY: i32 = 100;

/// Request body for `POST /contractors/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct ContractorSignupRequest {
    #[validate(length(min = 1, max = 200))]
    pub company_name: String,
    #[validate(length(min = 1, max = 200))]
    pub contact_name: String,
    #[validate(email)]
    pub contact_email: String,
    #[validate(length(min = 7, max = 30))]
    pub contact_phone: String,
    #[validate(url)]
    pub api_url: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub service_type_ids: Vec<DbId>,
    pub zip_codes: Vec<String>,
    pub min_bid: Option<f64>,
    pub max_bid: Option<f64>,
}

/// What a signup created.
#[derive(Debug, Serialize)]
pub struct SignupResult {
    pub buyer_id: DbId,
    pub is_active: bool,
    pub service_config_ids: Vec<DbId>,
    pub zip_codes_covered: u64,
}

/// POST /api/v1/contractors/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<ContractorSignupRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let digits = input.contact_phone.chars().filter(char::is_ascii_digit).count();
    if !(10..=15).contains(&digits) {
        return Err(AppError::Core(CoreError::Validation(
            "contact_phone must contain 10 to 15 digits".into(),
        )));
    }

    let min_bid = input.min_bid.unwrap_or(DEFAULT_SIGNUP_MIN_BID);
    let max_bid = input.max_bid.unwrap_or(DEFAULT_SIGNUP_MAX_BID);
    validate_bid_range(min_bid, max_bid)?;

    let zip_codes = normalize_zip_codes(&input.zip_codes)?;

    let mut service_type_ids = input.service_type_ids.clone();
    service_type_ids.sort_unstable();
    service_type_ids.dedup();
    for id in &service_type_ids {
        let active = ServiceTypeRepo::find_by_id(&state.pool, *id)
            .await?
            .is_some_and(|st| st.is_active);
        if !active {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown or inactive service type {id}"
            ))));
        }
    }

    let buyer = CreateBuyer {
        name: input.company_name.trim().to_string(),
        buyer_type: BuyerType::Contractor,
        api_url: input.api_url.clone(),
        auth_config: None,
        ping_timeout_secs: None,
        post_timeout_secs: None,
        is_active: Some(false),
        company_name: Some(input.company_name.trim().to_string()),
        contact_name: Some(input.contact_name.trim().to_string()),
        contact_email: Some(input.contact_email.trim().to_string()),
        contact_phone: Some(input.contact_phone.trim().to_string()),
    };
    let configs: Vec<CreateBuyerServiceConfig> = service_type_ids
        .iter()
        .map(|&service_type_id| CreateBuyerServiceConfig {
            service_type_id,
            ping_url: None,
            post_url: None,
            ping_template: None,
            post_template: None,
            field_mappings: None,
            requires_trusted_form: None,
            requires_jornaya: None,
            min_bid,
            max_bid,
            is_active: None,
        })
        .collect();

    let records = BuyerRepo::create_with_coverage(
        &state.pool,
        &buyer,
        &generate_webhook_secret(),
        &configs,
        &zip_codes,
        DEFAULT_SIGNUP_PRIORITY,
    )
    .await?;

    tracing::info!(
        buyer_id = records.buyer.id,
        service_types = records.configs.len(),
        zip_codes = zip_codes.len(),
        zones_created = records.zones_created,
        "Contractor signed up",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SignupResult {
                buyer_id: records.buyer.id,
                is_active: records.buyer.is_active,
                service_config_ids: records.configs.iter().map(|c| c.id).collect(),
                zip_codes_covered: records.zones_created,
            },
        }),
    ))
}
