//! PING/POST transaction log models.

use leadbid_core::status::{TransactionAction, TransactionStatus};
use leadbid_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `transactions` table (one per outbound buyer call).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Transaction {
    pub id: DbId,
    pub lead_id: DbId,
    pub buyer_id: DbId,
    pub action_type: String,
    pub status: String,
    pub bid_amount: Option<f64>,
    pub response_time_ms: Option<i32>,
    pub error_message: Option<String>,
    pub request_payload: Option<serde_json::Value>,
    pub response_payload: Option<serde_json::Value>,
    pub has_trusted_form: bool,
    pub has_jornaya: bool,
    pub created_at: Timestamp,
}

impl Transaction {
    /// Parsed status. The `CHECK` constraint keeps the column valid.
    pub fn transaction_status(&self) -> TransactionStatus {
        self.status.parse().unwrap_or(TransactionStatus::Pending)
    }
}

/// Insert input for a transaction row.
#[derive(Debug, Clone)]
pub struct CreateTransaction {
    pub lead_id: DbId,
    pub buyer_id: DbId,
    pub action_type: TransactionAction,
    pub status: TransactionStatus,
    pub bid_amount: Option<f64>,
    pub response_time_ms: Option<i32>,
    pub error_message: Option<String>,
    pub request_payload: Option<serde_json::Value>,
    pub response_payload: Option<serde_json::Value>,
    pub has_trusted_form: bool,
    pub has_jornaya: bool,
}

/// List filters for `GET /admin/transactions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionFilter {
    pub lead_id: Option<DbId>,
    pub buyer_id: Option<DbId>,
    pub action_type: Option<TransactionAction>,
    pub status: Option<TransactionStatus>,
}
