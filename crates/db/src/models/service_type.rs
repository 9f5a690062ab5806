//! Service type (quiz vertical) models and DTOs.

use leadbid_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `service_types` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ServiceType {
    pub id: DbId,
    pub name: String,
    pub display_name: String,
    /// JSON description of the dynamic quiz form for this service.
    pub form_schema: serde_json::Value,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a service type.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceType {
    pub name: String,
    pub display_name: String,
    pub form_schema: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

/// DTO for updating a service type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateServiceType {
    pub display_name: Option<String>,
    pub form_schema: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}
