//! Lead models and DTOs.

use leadbid_core::compliance::ComplianceTokens;
use leadbid_core::status::LeadStatus;
use leadbid_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `leads` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lead {
    pub id: DbId,
    pub service_type_id: DbId,
    pub form_data: serde_json::Value,
    pub zip_code: String,
    pub owns_home: Option<bool>,
    pub timeframe: Option<String>,
    pub status: String,
    pub winning_buyer_id: Option<DbId>,
    pub winning_bid: Option<f64>,
    pub trusted_form_cert_url: Option<String>,
    pub trusted_form_cert_id: Option<String>,
    pub jornaya_lead_id: Option<String>,
    pub compliance_data: Option<serde_json::Value>,
    pub lead_quality_score: Option<i32>,
    pub tcpa_consent: bool,
    pub tcpa_consent_text: Option<String>,
    pub rejection_reason: Option<String>,
    pub auction_started_at: Option<Timestamp>,
    pub auction_completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Lead {
    /// Parsed status. The `CHECK` constraint keeps the column valid.
    pub fn lead_status(&self) -> LeadStatus {
        self.status.parse().unwrap_or(LeadStatus::Pending)
    }

    pub fn compliance_tokens(&self) -> ComplianceTokens {
        ComplianceTokens {
            trusted_form_cert_url: self.trusted_form_cert_url.clone(),
            trusted_form_cert_id: self.trusted_form_cert_id.clone(),
            jornaya_lead_id: self.jornaya_lead_id.clone(),
        }
    }
}

/// Insert input for a new lead (already validated by the API layer).
#[derive(Debug, Clone)]
pub struct CreateLead {
    pub service_type_id: DbId,
    pub form_data: serde_json::Value,
    pub zip_code: String,
    pub owns_home: Option<bool>,
    pub timeframe: Option<String>,
    pub compliance: ComplianceTokens,
    pub compliance_data: Option<serde_json::Value>,
    pub lead_quality_score: i32,
    pub tcpa_consent: bool,
    pub tcpa_consent_text: Option<String>,
}

/// List filters for `GET /admin/leads`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub service_type_id: Option<DbId>,
    pub zip_code: Option<String>,
}
