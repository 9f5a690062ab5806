//! Append-only compliance audit log models.

use leadbid_core::status::ComplianceEvent;
use leadbid_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `compliance_audit_log` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComplianceAuditEntry {
    pub id: DbId,
    pub lead_id: DbId,
    pub event_type: String,
    pub event_data: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: Timestamp,
}

/// Insert input for an audit entry.
#[derive(Debug, Clone)]
pub struct CreateComplianceAuditEntry {
    pub lead_id: DbId,
    pub event_type: ComplianceEvent,
    pub event_data: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl CreateComplianceAuditEntry {
    /// An entry with no request metadata (system-generated events).
    pub fn system(lead_id: DbId, event_type: ComplianceEvent, event_data: serde_json::Value) -> Self {
        Self {
            lead_id,
            event_type,
            event_data,
            ip_address: None,
            user_agent: None,
        }
    }
}
