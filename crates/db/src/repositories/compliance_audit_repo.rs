//! Repository for the append-only `compliance_audit_log` table.
//!
//! No update or delete: the database trigger rejects both.

use leadbid_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::compliance_audit::{ComplianceAuditEntry, CreateComplianceAuditEntry};

const COLUMNS: &str = "id, lead_id, event_type, event_data, ip_address, user_agent, created_at";

pub struct ComplianceAuditRepo;

impl ComplianceAuditRepo {
    /// Append an entry.
    pub async fn append<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateComplianceAuditEntry,
    ) -> Result<ComplianceAuditEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO compliance_audit_log \
                (lead_id, event_type, event_data, ip_address, user_agent) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ComplianceAuditEntry>(&query)
            .bind(input.lead_id)
            .bind(input.event_type.as_str())
            .bind(&input.event_data)
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .fetch_one(executor)
            .await
    }

    /// The full history for a lead, oldest first.
    pub async fn list_for_lead(
        pool: &PgPool,
        lead_id: DbId,
    ) -> Result<Vec<ComplianceAuditEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM compliance_audit_log WHERE lead_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, ComplianceAuditEntry>(&query)
            .bind(lead_id)
            .fetch_all(pool)
            .await
    }
}
