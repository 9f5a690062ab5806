//! Repository for the `leads` table.
//!
//! Status transitions are guarded by `WHERE status = 'PENDING'`: once a lead
//! is SOLD or REJECTED no update touches it again.

use leadbid_core::status::LeadStatus;
use leadbid_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::lead::{CreateLead, Lead, LeadFilter};

/// Column list for the `leads` table.
const COLUMNS: &str = "id, service_type_id, form_data, zip_code, owns_home, timeframe, status, \
    winning_buyer_id, winning_bid, trusted_form_cert_url, trusted_form_cert_id, jornaya_lead_id, \
    compliance_data, lead_quality_score, tcpa_consent, tcpa_consent_text, rejection_reason, \
    auction_started_at, auction_completed_at, created_at, updated_at";

/// Shared `WHERE` clause for list and count; binds `$1..$3`.
const FILTER_CLAUSE: &str = "($1::text IS NULL OR status = $1) \
    AND ($2::bigint IS NULL OR service_type_id = $2) \
    AND ($3::text IS NULL OR zip_code = $3)";

/// Provides persistence and state transitions for leads.
pub struct LeadRepo;

impl LeadRepo {
    /// Insert a new PENDING lead.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateLead,
    ) -> Result<Lead, sqlx::Error> {
        let query = format!(
            "INSERT INTO leads \
                (service_type_id, form_data, zip_code, owns_home, timeframe, \
                 trusted_form_cert_url, trusted_form_cert_id, jornaya_lead_id, compliance_data, \
                 lead_quality_score, tcpa_consent, tcpa_consent_text) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lead>(&query)
            .bind(input.service_type_id)
            .bind(&input.form_data)
            .bind(&input.zip_code)
            .bind(input.owns_home)
            .bind(&input.timeframe)
            .bind(&input.compliance.trusted_form_cert_url)
            .bind(&input.compliance.trusted_form_cert_id)
            .bind(&input.compliance.jornaya_lead_id)
            .bind(&input.compliance_data)
            .bind(input.lead_quality_score)
            .bind(input.tcpa_consent)
            .bind(&input.tcpa_consent_text)
            .fetch_one(executor)
            .await
    }

    /// Find a lead by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Lead>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM leads WHERE id = $1");
        sqlx::query_as::<_, Lead>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List leads matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &LeadFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Lead>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM leads WHERE {FILTER_CLAUSE} \
             ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Lead>(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.service_type_id)
            .bind(&filter.zip_code)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count leads matching `filter`.
    pub async fn count(pool: &PgPool, filter: &LeadFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM leads WHERE {FILTER_CLAUSE}");
        let (count,): (i64,) = sqlx::query_as(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.service_type_id)
            .bind(&filter.zip_code)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Claim the oldest unclaimed PENDING lead for auction.
    ///
    /// Uses `FOR UPDATE SKIP LOCKED` so concurrent dispatchers never claim
    /// the same lead.
    pub async fn claim_next_pending(pool: &PgPool) -> Result<Option<Lead>, sqlx::Error> {
        let query = format!(
            "UPDATE leads SET auction_started_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM leads \
                 WHERE status = 'PENDING' AND auction_started_at IS NULL \
                 ORDER BY created_at, id \
                 FOR UPDATE SKIP LOCKED \
                 LIMIT 1 \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lead>(&query).fetch_optional(pool).await
    }

    /// Claim a specific lead for auction. Returns `None` if the lead is not
    /// PENDING or an auction already claimed it.
    pub async fn claim_by_id(pool: &PgPool, id: DbId) -> Result<Option<Lead>, sqlx::Error> {
        let query = format!(
            "UPDATE leads SET auction_started_at = NOW() \
             WHERE id = $1 AND status = 'PENDING' AND auction_started_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lead>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Release claims on PENDING leads whose auction started more than
    /// `older_than_secs` ago without completing. Returns the number released.
    pub async fn release_stale_claims(pool: &PgPool, older_than_secs: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE leads SET auction_started_at = NULL \
             WHERE status = 'PENDING' \
               AND auction_started_at IS NOT NULL \
               AND auction_started_at < NOW() - make_interval(secs => $1)",
        )
        .bind(older_than_secs as f64)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Clear the auction claim on a PENDING lead so the dispatcher picks it
    /// up again. Returns `false` if the lead is final or was not claimed.
    pub async fn release_claim(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE leads SET auction_started_at = NULL \
             WHERE id = $1 AND status = 'PENDING' AND auction_started_at IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a PENDING lead as SOLD. Returns `None` if the lead was already
    /// final.
    pub async fn mark_sold<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        buyer_id: DbId,
        bid: f64,
    ) -> Result<Option<Lead>, sqlx::Error> {
        let query = format!(
            "UPDATE leads SET status = $2, winning_buyer_id = $3, winning_bid = $4, \
                 auction_completed_at = NOW() \
             WHERE id = $1 AND status = 'PENDING' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lead>(&query)
            .bind(id)
            .bind(LeadStatus::Sold.as_str())
            .bind(buyer_id)
            .bind(bid)
            .fetch_optional(executor)
            .await
    }

    /// Mark a PENDING lead as REJECTED with a reason. Returns `None` if the
    /// lead was already final.
    pub async fn mark_rejected<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        reason: &str,
    ) -> Result<Option<Lead>, sqlx::Error> {
        let query = format!(
            "UPDATE leads SET status = $2, rejection_reason = $3, auction_completed_at = NOW() \
             WHERE id = $1 AND status = 'PENDING' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lead>(&query)
            .bind(id)
            .bind(LeadStatus::Rejected.as_str())
            .bind(reason)
            .fetch_optional(executor)
            .await
    }
}
