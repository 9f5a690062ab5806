//! Buyer (contractor / lead network) models and DTOs.

use leadbid_core::status::BuyerType;
use leadbid_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `buyers` table.
///
/// **Note:** `webhook_secret` is never serialized to responses; it is shown
/// once when created or rotated.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Buyer {
    pub id: DbId,
    pub name: String,
    pub buyer_type: String,
    pub api_url: Option<String>,
    pub auth_config: Option<serde_json::Value>,
    #[serde(skip_serializing)]
    pub webhook_secret: Option<String>,
    pub ping_timeout_secs: i32,
    pub post_timeout_secs: i32,
    pub is_active: bool,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a buyer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBuyer {
    pub name: String,
    pub buyer_type: BuyerType,
    pub api_url: Option<String>,
    pub auth_config: Option<serde_json::Value>,
    pub ping_timeout_secs: Option<i32>,
    pub post_timeout_secs: Option<i32>,
    pub is_active: Option<bool>,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

/// DTO for updating a buyer. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBuyer {
    pub name: Option<String>,
    pub buyer_type: Option<BuyerType>,
    pub api_url: Option<String>,
    pub auth_config: Option<serde_json::Value>,
    pub ping_timeout_secs: Option<i32>,
    pub post_timeout_secs: Option<i32>,
    pub is_active: Option<bool>,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

/// List filters for `GET /admin/buyers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuyerFilter {
    pub buyer_type: Option<BuyerType>,
    pub is_active: Option<bool>,
    /// Case-insensitive substring match on name, company, or contact email.
    pub search: Option<String>,
}

/// Counts of rows that reference a buyer.
#[derive(Debug, Clone, Copy, Default, FromRow, Serialize)]
pub struct BuyerReferences {
    pub config_count: i64,
    pub zone_count: i64,
    pub lead_count: i64,
    pub transaction_count: i64,
}

impl BuyerReferences {
    pub fn is_referenced(&self) -> bool {
        self.config_count + self.zone_count + self.lead_count + self.transaction_count > 0
    }
}
