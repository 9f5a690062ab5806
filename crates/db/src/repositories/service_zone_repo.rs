//! Repository for the `buyer_service_zip_codes` table (zip coverage).

use leadbid_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::service_zone::{
    BulkCreateServiceZones, BulkZoneResult, CreateServiceZone, EligibilityCandidate, ServiceZone,
    ServiceZoneFilter, UpdateServiceZone, DEFAULT_ZONE_PRIORITY,
};

/// Column list for the `buyer_service_zip_codes` table.
const COLUMNS: &str = "id, buyer_id, service_type_id, zip_code, is_active, priority, \
    max_leads_per_day, min_bid, max_bid, created_at, updated_at";

/// Shared `WHERE` clause for list and count; binds `$1..$4`.
const FILTER_CLAUSE: &str = "($1::bigint IS NULL OR buyer_id = $1) \
    AND ($2::bigint IS NULL OR service_type_id = $2) \
    AND ($3::text IS NULL OR zip_code LIKE $3 || '%') \
    AND ($4::bool IS NULL OR is_active = $4)";

/// Provides CRUD operations for service zones and the eligibility lookup.
pub struct ServiceZoneRepo;

impl ServiceZoneRepo {
    /// Insert a single zone. `zip_code` must already be normalized.
    pub async fn create(
        pool: &PgPool,
        input: &CreateServiceZone,
    ) -> Result<ServiceZone, sqlx::Error> {
        let query = format!(
            "INSERT INTO buyer_service_zip_codes \
                (buyer_id, service_type_id, zip_code, is_active, priority, max_leads_per_day, \
                 min_bid, max_bid) \
             VALUES ($1, $2, $3, COALESCE($4, true), COALESCE($5, {DEFAULT_ZONE_PRIORITY}), \
                     $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceZone>(&query)
            .bind(input.buyer_id)
            .bind(input.service_type_id)
            .bind(&input.zip_code)
            .bind(input.is_active)
            .bind(input.priority)
            .bind(input.max_leads_per_day)
            .bind(input.min_bid)
            .bind(input.max_bid)
            .fetch_one(pool)
            .await
    }

    /// Insert many zip codes for one buyer + service type, skipping any
    /// already covered. `zip_codes` must already be normalized.
    pub async fn bulk_create(
        pool: &PgPool,
        input: &BulkCreateServiceZones,
        zip_codes: &[String],
    ) -> Result<BulkZoneResult, sqlx::Error> {
        let query = format!(
            "INSERT INTO buyer_service_zip_codes \
                (buyer_id, service_type_id, zip_code, priority, max_leads_per_day, min_bid, max_bid) \
             SELECT $1, $2, z, COALESCE($4, {DEFAULT_ZONE_PRIORITY}), $5, $6, $7 \
             FROM UNNEST($3::text[]) AS z \
             ON CONFLICT (buyer_id, service_type_id, zip_code) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, ServiceZone>(&query)
            .bind(input.buyer_id)
            .bind(input.service_type_id)
            .bind(zip_codes)
            .bind(input.priority)
            .bind(input.max_leads_per_day)
            .bind(input.min_bid)
            .bind(input.max_bid)
            .fetch_all(pool)
            .await?;

        let skipped_zip_codes = zip_codes
            .iter()
            .filter(|zip| !created.iter().any(|z| &z.zip_code == *zip))
            .cloned()
            .collect();

        Ok(BulkZoneResult {
            created,
            skipped_zip_codes,
        })
    }

    /// Insert plain coverage rows inside a caller-owned transaction.
    /// Returns the number of rows created.
    pub(crate) async fn insert_zip_codes<'e, E: PgExecutor<'e>>(
        executor: E,
        buyer_id: DbId,
        service_type_id: DbId,
        zip_codes: &[String],
        priority: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO buyer_service_zip_codes (buyer_id, service_type_id, zip_code, priority) \
             SELECT $1, $2, z, $4 FROM UNNEST($3::text[]) AS z \
             ON CONFLICT (buyer_id, service_type_id, zip_code) DO NOTHING",
        )
        .bind(buyer_id)
        .bind(service_type_id)
        .bind(zip_codes)
        .bind(priority)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Find a zone by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ServiceZone>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM buyer_service_zip_codes WHERE id = $1");
        sqlx::query_as::<_, ServiceZone>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List zones matching `filter`. `zip_code` filters by prefix.
    pub async fn list(
        pool: &PgPool,
        filter: &ServiceZoneFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ServiceZone>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM buyer_service_zip_codes WHERE {FILTER_CLAUSE} \
             ORDER BY zip_code, priority DESC, id LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, ServiceZone>(&query)
            .bind(filter.buyer_id)
            .bind(filter.service_type_id)
            .bind(&filter.zip_code)
            .bind(filter.is_active)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count zones matching `filter`.
    pub async fn count(pool: &PgPool, filter: &ServiceZoneFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM buyer_service_zip_codes WHERE {FILTER_CLAUSE}");
        let (count,): (i64,) = sqlx::query_as(&query)
            .bind(filter.buyer_id)
            .bind(filter.service_type_id)
            .bind(&filter.zip_code)
            .bind(filter.is_active)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Update a zone. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateServiceZone,
    ) -> Result<Option<ServiceZone>, sqlx::Error> {
        let query = format!(
            "UPDATE buyer_service_zip_codes SET \
                 is_active = COALESCE($2, is_active), \
                 priority = COALESCE($3, priority), \
                 max_leads_per_day = COALESCE($4, max_leads_per_day), \
                 min_bid = COALESCE($5, min_bid), \
                 max_bid = COALESCE($6, max_bid) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceZone>(&query)
            .bind(id)
            .bind(input.is_active)
            .bind(input.priority)
            .bind(input.max_leads_per_day)
            .bind(input.min_bid)
            .bind(input.max_bid)
            .fetch_optional(pool)
            .await
    }

    /// Delete a zone by ID.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM buyer_service_zip_codes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Active buyers with an active config and active coverage for the
    /// service type + zip, ranked by zone priority (highest first) then
    /// buyer id. Daily sales are counted since UTC midnight.
    pub async fn find_candidates(
        pool: &PgPool,
        service_type_id: DbId,
        zip_code: &str,
    ) -> Result<Vec<EligibilityCandidate>, sqlx::Error> {
        sqlx::query_as::<_, EligibilityCandidate>(
            "SELECT b.id AS buyer_id, b.name AS buyer_name, z.id AS zone_id, z.priority, \
                    z.max_leads_per_day, z.min_bid AS zone_min_bid, z.max_bid AS zone_max_bid, \
                    c.requires_trusted_form, c.requires_jornaya, \
                    (SELECT COUNT(*) FROM leads l \
                      WHERE l.winning_buyer_id = b.id \
                        AND l.service_type_id = z.service_type_id \
                        AND l.status = 'SOLD' \
                        AND l.auction_completed_at >= \
                            date_trunc('day', NOW() AT TIME ZONE 'UTC') AT TIME ZONE 'UTC' \
                    ) AS sold_today \
             FROM buyer_service_zip_codes z \
             JOIN buyers b ON b.id = z.buyer_id \
             JOIN buyer_service_configs c \
               ON c.buyer_id = z.buyer_id AND c.service_type_id = z.service_type_id \
             WHERE z.service_type_id = $1 AND z.zip_code = $2 \
               AND z.is_active AND b.is_active AND c.is_active \
             ORDER BY z.priority DESC, b.id ASC",
        )
        .bind(service_type_id)
        .bind(zip_code)
        .fetch_all(pool)
        .await
    }
}
