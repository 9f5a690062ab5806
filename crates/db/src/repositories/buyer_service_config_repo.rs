//! Repository for the `buyer_service_configs` table.

use leadbid_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::buyer_service_config::{
    AuctionConfigRow, BuyerServiceConfig, CreateBuyerServiceConfig, UpdateBuyerServiceConfig,
};

/// Column list for the `buyer_service_configs` table.
const COLUMNS: &str = "id, buyer_id, service_type_id, ping_url, post_url, ping_template, \
    post_template, field_mappings, requires_trusted_form, requires_jornaya, min_bid, max_bid, \
    is_active, created_at, updated_at";

/// Buyer + config columns for [`AuctionConfigRow`].
const AUCTION_COLUMNS: &str = "b.id AS buyer_id, b.name AS buyer_name, b.api_url, \
    b.auth_config, b.webhook_secret, b.ping_timeout_secs, b.post_timeout_secs, \
    c.id AS config_id, c.service_type_id, c.ping_url, c.post_url, c.ping_template, \
    c.post_template, c.field_mappings, c.requires_trusted_form, c.requires_jornaya, \
    c.min_bid, c.max_bid";

/// Provides CRUD operations for buyer service configs.
pub struct BuyerServiceConfigRepo;

impl BuyerServiceConfigRepo {
    /// Insert a config for `buyer_id`.
    pub async fn create(
        pool: &PgPool,
        buyer_id: DbId,
        input: &CreateBuyerServiceConfig,
    ) -> Result<BuyerServiceConfig, sqlx::Error> {
        Self::insert(pool, buyer_id, input).await
    }

    pub(crate) async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        buyer_id: DbId,
        input: &CreateBuyerServiceConfig,
    ) -> Result<BuyerServiceConfig, sqlx::Error> {
        let query = format!(
            "INSERT INTO buyer_service_configs \
                (buyer_id, service_type_id, ping_url, post_url, ping_template, post_template, \
                 field_mappings, requires_trusted_form, requires_jornaya, min_bid, max_bid, \
                 is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, false), COALESCE($9, false), \
                     $10, $11, COALESCE($12, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BuyerServiceConfig>(&query)
            .bind(buyer_id)
            .bind(input.service_type_id)
            .bind(&input.ping_url)
            .bind(&input.post_url)
            .bind(&input.ping_template)
            .bind(&input.post_template)
            .bind(&input.field_mappings)
            .bind(input.requires_trusted_form)
            .bind(input.requires_jornaya)
            .bind(input.min_bid)
            .bind(input.max_bid)
            .bind(input.is_active)
            .fetch_one(executor)
            .await
    }

    /// Find a config by its internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<BuyerServiceConfig>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM buyer_service_configs WHERE id = $1");
        sqlx::query_as::<_, BuyerServiceConfig>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every config belonging to a buyer.
    pub async fn list_for_buyer(
        pool: &PgPool,
        buyer_id: DbId,
    ) -> Result<Vec<BuyerServiceConfig>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM buyer_service_configs \
             WHERE buyer_id = $1 ORDER BY service_type_id"
        );
        sqlx::query_as::<_, BuyerServiceConfig>(&query)
            .bind(buyer_id)
            .fetch_all(pool)
            .await
    }

    /// Update a config. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateBuyerServiceConfig,
    ) -> Result<Option<BuyerServiceConfig>, sqlx::Error> {
        let query = format!(
            "UPDATE buyer_service_configs SET \
                 ping_url = COALESCE($2, ping_url), \
                 post_url = COALESCE($3, post_url), \
                 ping_template = COALESCE($4, ping_template), \
                 post_template = COALESCE($5, post_template), \
                 field_mappings = COALESCE($6, field_mappings), \
                 requires_trusted_form = COALESCE($7, requires_trusted_form), \
                 requires_jornaya = COALESCE($8, requires_jornaya), \
                 min_bid = COALESCE($9, min_bid), \
                 max_bid = COALESCE($10, max_bid), \
                 is_active = COALESCE($11, is_active) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BuyerServiceConfig>(&query)
            .bind(id)
            .bind(&input.ping_url)
            .bind(&input.post_url)
            .bind(&input.ping_template)
            .bind(&input.post_template)
            .bind(&input.field_mappings)
            .bind(input.requires_trusted_form)
            .bind(input.requires_jornaya)
            .bind(input.min_bid)
            .bind(input.max_bid)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Count zip coverage rows for the config's (buyer, service type).
    pub async fn count_zip_codes(pool: &PgPool, config: &BuyerServiceConfig) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM buyer_service_zip_codes \
             WHERE buyer_id = $1 AND service_type_id = $2",
        )
        .bind(config.buyer_id)
        .bind(config.service_type_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Delete a config unless its buyer still covers zip codes for the
    /// config's service type. Returns `false` when nothing was deleted,
    /// either because coverage remains or the config is gone.
    pub async fn delete_if_no_zip_codes(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM buyer_service_configs c \
             WHERE c.id = $1 \
               AND NOT EXISTS ( \
                   SELECT 1 FROM buyer_service_zip_codes z \
                   WHERE z.buyer_id = c.buyer_id AND z.service_type_id = c.service_type_id \
               )",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Load the joined buyer + config used by auctions, if both are active.
    pub async fn find_auction_config(
        pool: &PgPool,
        buyer_id: DbId,
        service_type_id: DbId,
    ) -> Result<Option<AuctionConfigRow>, sqlx::Error> {
        let query = format!(
            "SELECT {AUCTION_COLUMNS} \
             FROM buyer_service_configs c \
             JOIN buyers b ON b.id = c.buyer_id \
             WHERE c.buyer_id = $1 AND c.service_type_id = $2 \
               AND c.is_active AND b.is_active"
        );
        sqlx::query_as::<_, AuctionConfigRow>(&query)
            .bind(buyer_id)
            .bind(service_type_id)
            .fetch_optional(pool)
            .await
    }
}
