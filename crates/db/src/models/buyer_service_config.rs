//! Buyer-per-service configuration models and DTOs.

use leadbid_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `buyer_service_configs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BuyerServiceConfig {
    pub id: DbId,
    pub buyer_id: DbId,
    pub service_type_id: DbId,
    pub ping_url: Option<String>,
    pub post_url: Option<String>,
    pub ping_template: Option<serde_json::Value>,
    pub post_template: Option<serde_json::Value>,
    pub field_mappings: Option<serde_json::Value>,
    pub requires_trusted_form: bool,
    pub requires_jornaya: bool,
    pub min_bid: f64,
    pub max_bid: f64,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a config. `buyer_id` comes from the URL path.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBuyerServiceConfig {
    pub service_type_id: DbId,
    pub ping_url: Option<String>,
    pub post_url: Option<String>,
    pub ping_template: Option<serde_json::Value>,
    pub post_template: Option<serde_json::Value>,
    pub field_mappings: Option<serde_json::Value>,
    pub requires_trusted_form: Option<bool>,
    pub requires_jornaya: Option<bool>,
    pub min_bid: f64,
    pub max_bid: f64,
    pub is_active: Option<bool>,
}

/// DTO for updating a config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBuyerServiceConfig {
    pub ping_url: Option<String>,
    pub post_url: Option<String>,
    pub ping_template: Option<serde_json::Value>,
    pub post_template: Option<serde_json::Value>,
    pub field_mappings: Option<serde_json::Value>,
    pub requires_trusted_form: Option<bool>,
    pub requires_jornaya: Option<bool>,
    pub min_bid: Option<f64>,
    pub max_bid: Option<f64>,
    pub is_active: Option<bool>,
}

/// Buyer and service config joined, as consumed by the auction engine.
#[derive(Debug, Clone, FromRow)]
pub struct AuctionConfigRow {
    pub buyer_id: DbId,
    pub buyer_name: String,
    pub api_url: Option<String>,
    pub auth_config: Option<serde_json::Value>,
    pub webhook_secret: Option<String>,
    pub ping_timeout_secs: i32,
    pub post_timeout_secs: i32,
    pub config_id: DbId,
    pub service_type_id: DbId,
    pub ping_url: Option<String>,
    pub post_url: Option<String>,
    pub ping_template: Option<serde_json::Value>,
    pub post_template: Option<serde_json::Value>,
    pub field_mappings: Option<serde_json::Value>,
    pub requires_trusted_form: bool,
    pub requires_jornaya: bool,
    pub min_bid: f64,
    pub max_bid: f64,
}
