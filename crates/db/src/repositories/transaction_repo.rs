//! Repository for the `transactions` table (PING/POST call log).

use leadbid_core::status::TransactionStatus;
use leadbid_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::transaction::{CreateTransaction, Transaction, TransactionFilter};

/// Column list for the `transactions` table.
const COLUMNS: &str = "id, lead_id, buyer_id, action_type, status, bid_amount, response_time_ms, \
    error_message, request_payload, response_payload, has_trusted_form, has_jornaya, created_at";

/// Shared `WHERE` clause for list and count; binds `$1..$4`.
const FILTER_CLAUSE: &str = "($1::bigint IS NULL OR lead_id = $1) \
    AND ($2::bigint IS NULL OR buyer_id = $2) \
    AND ($3::text IS NULL OR action_type = $3) \
    AND ($4::text IS NULL OR status = $4)";

/// Provides insert and query operations for transactions.
pub struct TransactionRepo;

impl TransactionRepo {
    /// Record one outbound buyer call.
    ///
    /// A second POST for the same lead violates `uq_transactions_lead_post`.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateTransaction,
    ) -> Result<Transaction, sqlx::Error> {
        let query = format!(
            "INSERT INTO transactions \
                (lead_id, buyer_id, action_type, status, bid_amount, response_time_ms, \
                 error_message, request_payload, response_payload, has_trusted_form, has_jornaya) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Transaction>(&query)
            .bind(input.lead_id)
            .bind(input.buyer_id)
            .bind(input.action_type.as_str())
            .bind(input.status.as_str())
            .bind(input.bid_amount)
            .bind(input.response_time_ms)
            .bind(&input.error_message)
            .bind(&input.request_payload)
            .bind(&input.response_payload)
            .bind(input.has_trusted_form)
            .bind(input.has_jornaya)
            .fetch_one(executor)
            .await
    }

    /// Settle a PENDING transaction with the outcome of the call.
    pub async fn finish<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        status: TransactionStatus,
        response_time_ms: Option<i32>,
        error_message: Option<&str>,
        response_payload: Option<&serde_json::Value>,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        let query = format!(
            "UPDATE transactions SET status = $2, response_time_ms = $3, error_message = $4, \
                 response_payload = $5 \
             WHERE id = $1 AND status = 'PENDING' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Transaction>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(response_time_ms)
            .bind(error_message)
            .bind(response_payload)
            .fetch_optional(executor)
            .await
    }

    /// The lead's POST row, if a POST was ever reserved for it.
    pub async fn find_post_for_lead(
        pool: &PgPool,
        lead_id: DbId,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM transactions WHERE lead_id = $1 AND action_type = 'POST'"
        );
        sqlx::query_as::<_, Transaction>(&query)
            .bind(lead_id)
            .fetch_optional(pool)
            .await
    }

    /// All transactions for a lead in call order.
    pub async fn list_for_lead(pool: &PgPool, lead_id: DbId) -> Result<Vec<Transaction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM transactions WHERE lead_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Transaction>(&query)
            .bind(lead_id)
            .fetch_all(pool)
            .await
    }

    /// List transactions matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &TransactionFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM transactions WHERE {FILTER_CLAUSE} \
             ORDER BY created_at DESC, id DESC LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Transaction>(&query)
            .bind(filter.lead_id)
            .bind(filter.buyer_id)
            .bind(filter.action_type.map(|a| a.as_str()))
            .bind(filter.status.map(|s| s.as_str()))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count transactions matching `filter`.
    pub async fn count(pool: &PgPool, filter: &TransactionFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM transactions WHERE {FILTER_CLAUSE}");
        let (count,): (i64,) = sqlx::query_as(&query)
            .bind(filter.lead_id)
            .bind(filter.buyer_id)
            .bind(filter.action_type.map(|a| a.as_str()))
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
