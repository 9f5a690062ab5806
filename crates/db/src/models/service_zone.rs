//! Zip coverage ("service zone") models and DTOs for the
//! `buyer_service_zip_codes` table.

use leadbid_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Default zone priority when none is supplied.
pub const DEFAULT_ZONE_PRIORITY: i32 = 100;

/// A row from the `buyer_service_zip_codes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ServiceZone {
    pub id: DbId,
    pub buyer_id: DbId,
    pub service_type_id: DbId,
    pub zip_code: String,
    pub is_active: bool,
    pub priority: i32,
    pub max_leads_per_day: Option<i32>,
    pub min_bid: Option<f64>,
    pub max_bid: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a single zone.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceZone {
    pub buyer_id: DbId,
    pub service_type_id: DbId,
    pub zip_code: String,
    pub is_active: Option<bool>,
    pub priority: Option<i32>,
    pub max_leads_per_day: Option<i32>,
    pub min_bid: Option<f64>,
    pub max_bid: Option<f64>,
}

/// DTO for adding many zip codes to one buyer + service type.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkCreateServiceZones {
    pub buyer_id: DbId,
    pub service_type_id: DbId,
    pub zip_codes: Vec<String>,
    pub priority: Option<i32>,
    pub max_leads_per_day: Option<i32>,
    pub min_bid: Option<f64>,
    pub max_bid: Option<f64>,
}

/// DTO for updating a zone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateServiceZone {
    pub is_active: Option<bool>,
    pub priority: Option<i32>,
    pub max_leads_per_day: Option<i32>,
    pub min_bid: Option<f64>,
    pub max_bid: Option<f64>,
}

/// List filters for `GET /admin/service-zones`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceZoneFilter {
    pub buyer_id: Option<DbId>,
    pub service_type_id: Option<DbId>,
    pub zip_code: Option<String>,
    pub is_active: Option<bool>,
}

/// Outcome of a bulk insert: zips created vs. already covered.
#[derive(Debug, Clone, Serialize)]
pub struct BulkZoneResult {
    pub created: Vec<ServiceZone>,
    pub skipped_zip_codes: Vec<String>,
}

/// A candidate buyer for a lead, before compliance and cap filtering.
#[derive(Debug, Clone, FromRow)]
pub struct EligibilityCandidate {
    pub buyer_id: DbId,
    pub buyer_name: String,
    pub zone_id: DbId,
    pub priority: i32,
    pub max_leads_per_day: Option<i32>,
    pub zone_min_bid: Option<f64>,
    pub zone_max_bid: Option<f64>,
    pub requires_trusted_form: bool,
    pub requires_jornaya: bool,
    /// Leads of this service type sold to the buyer since UTC midnight.
    pub sold_today: i64,
}
