//! Repository for the `buyers` table.

use leadbid_core::search::escape_like;
use leadbid_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::buyer::{Buyer, BuyerFilter, BuyerReferences, CreateBuyer, UpdateBuyer};
use crate::models::buyer_service_config::{BuyerServiceConfig, CreateBuyerServiceConfig};
use crate::repositories::{BuyerServiceConfigRepo, ServiceZoneRepo};

/// Column list for the `buyers` table.
const COLUMNS: &str = "id, name, buyer_type, api_url, auth_config, webhook_secret, \
    ping_timeout_secs, post_timeout_secs, is_active, company_name, contact_name, \
    contact_email, contact_phone, created_at, updated_at";

/// Shared `WHERE` clause for list and count; binds `$1..$3`.
const FILTER_CLAUSE: &str = "($1::text IS NULL OR buyer_type = $1) \
    AND ($2::bool IS NULL OR is_active = $2) \
    AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%' \
         OR company_name ILIKE '%' || $3 || '%' \
         OR contact_email ILIKE '%' || $3 || '%')";

/// Result of a self-service signup: the buyer plus the coverage created.
#[derive(Debug, Clone)]
pub struct SignupRecords {
    pub buyer: Buyer,
    pub configs: Vec<BuyerServiceConfig>,
    pub zones_created: u64,
}

/// Provides CRUD operations for buyers.
pub struct BuyerRepo;

impl BuyerRepo {
    /// Insert a new buyer with the given signing secret.
    pub async fn create(
        pool: &PgPool,
        input: &CreateBuyer,
        webhook_secret: &str,
    ) -> Result<Buyer, sqlx::Error> {
        Self::insert(pool, input, webhook_secret).await
    }

    async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateBuyer,
        webhook_secret: &str,
    ) -> Result<Buyer, sqlx::Error> {
        let query = format!(
            "INSERT INTO buyers \
                (name, buyer_type, api_url, auth_config, webhook_secret, ping_timeout_secs, \
                 post_timeout_secs, is_active, company_name, contact_name, contact_email, \
                 contact_phone) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 5), COALESCE($7, 10), \
                     COALESCE($8, true), $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Buyer>(&query)
            .bind(&input.name)
            .bind(input.buyer_type.as_str())
            .bind(&input.api_url)
            .bind(&input.auth_config)
            .bind(webhook_secret)
            .bind(input.ping_timeout_secs)
            .bind(input.post_timeout_secs)
            .bind(input.is_active)
            .bind(&input.company_name)
            .bind(&input.contact_name)
            .bind(&input.contact_email)
            .bind(&input.contact_phone)
            .fetch_one(executor)
            .await
    }

    /// Create a buyer together with its service configs and zip coverage in
    /// one transaction. Either everything is written or nothing is.
    pub async fn create_with_coverage(
        pool: &PgPool,
        input: &CreateBuyer,
        webhook_secret: &str,
        configs: &[CreateBuyerServiceConfig],
        zip_codes: &[String],
        priority: i32,
    ) -> Result<SignupRecords, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let buyer = Self::insert(&mut *tx, input, webhook_secret).await?;

        let mut created_configs = Vec::with_capacity(configs.len());
        let mut zones_created = 0;
        for config in configs {
            let row = BuyerServiceConfigRepo::insert(&mut *tx, buyer.id, config).await?;
            zones_created += ServiceZoneRepo::insert_zip_codes(
                &mut *tx,
                buyer.id,
                config.service_type_id,
                zip_codes,
                priority,
            )
            .await?;
            created_configs.push(row);
        }

        tx.commit().await?;
        Ok(SignupRecords {
            buyer,
            configs: created_configs,
            zones_created,
        })
    }

    /// Find a buyer by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Buyer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM buyers WHERE id = $1");
        sqlx::query_as::<_, Buyer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List buyers matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &BuyerFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Buyer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM buyers WHERE {FILTER_CLAUSE} \
             ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Buyer>(&query)
            .bind(filter.buyer_type.map(|t| t.as_str()))
            .bind(filter.is_active)
            .bind(search_term(filter))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count buyers matching `filter`.
    pub async fn count(pool: &PgPool, filter: &BuyerFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM buyers WHERE {FILTER_CLAUSE}");
        let (count,): (i64,) = sqlx::query_as(&query)
            .bind(filter.buyer_type.map(|t| t.as_str()))
            .bind(filter.is_active)
            .bind(search_term(filter))
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Update a buyer. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateBuyer,
    ) -> Result<Option<Buyer>, sqlx::Error> {
        let query = format!(
            "UPDATE buyers SET \
                 name = COALESCE($2, name), \
                 buyer_type = COALESCE($3, buyer_type), \
                 api_url = COALESCE($4, api_url), \
                 auth_config = COALESCE($5, auth_config), \
                 ping_timeout_secs = COALESCE($6, ping_timeout_secs), \
                 post_timeout_secs = COALESCE($7, post_timeout_secs), \
                 is_active = COALESCE($8, is_active), \
                 company_name = COALESCE($9, company_name), \
                 contact_name = COALESCE($10, contact_name), \
                 contact_email = COALESCE($11, contact_email), \
                 contact_phone = COALESCE($12, contact_phone) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Buyer>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.buyer_type.map(|t| t.as_str()))
            .bind(&input.api_url)
            .bind(&input.auth_config)
            .bind(input.ping_timeout_secs)
            .bind(input.post_timeout_secs)
            .bind(input.is_active)
            .bind(&input.company_name)
            .bind(&input.contact_name)
            .bind(&input.contact_email)
            .bind(&input.contact_phone)
            .fetch_optional(pool)
            .await
    }

    /// Replace the buyer's signing secret.
    pub async fn set_webhook_secret(
        pool: &PgPool,
        id: DbId,
        webhook_secret: &str,
    ) -> Result<Option<Buyer>, sqlx::Error> {
        let query =
            format!("UPDATE buyers SET webhook_secret = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Buyer>(&query)
            .bind(id)
            .bind(webhook_secret)
            .fetch_optional(pool)
            .await
    }

    /// Count configs, zones, won leads, and transactions referencing a buyer.
    pub async fn references(pool: &PgPool, id: DbId) -> Result<BuyerReferences, sqlx::Error> {
        sqlx::query_as::<_, BuyerReferences>(
            "SELECT \
                 (SELECT COUNT(*) FROM buyer_service_configs WHERE buyer_id = $1) AS config_count, \
                 (SELECT COUNT(*) FROM buyer_service_zip_codes WHERE buyer_id = $1) AS zone_count, \
                 (SELECT COUNT(*) FROM leads WHERE winning_buyer_id = $1) AS lead_count, \
                 (SELECT COUNT(*) FROM transactions WHERE buyer_id = $1) AS transaction_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Mark a buyer inactive. Returns `false` if no row matched.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE buyers SET is_active = false WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hard-delete an unreferenced buyer.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM buyers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn search_term(filter: &BuyerFilter) -> Option<String> {
    filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(escape_like)
}
