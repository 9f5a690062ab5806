//! Cached buyer auction configuration.
//!
//! [`BuyerConfigurationRegistry`] joins a buyer with its service config,
//! resolves URL fallbacks and credentials, and keeps the result for a TTL.
//! Admin writes call [`BuyerConfigurationRegistry::invalidate_buyer`] so
//! changes take effect on the next auction.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use leadbid_core::auth_config::BuyerAuthConfig;
use leadbid_core::bidding::BidBounds;
use leadbid_core::compliance::ComplianceRequirements;
use leadbid_core::types::DbId;
use leadbid_db::models::buyer_service_config::AuctionConfigRow;
use leadbid_db::repositories::BuyerServiceConfigRepo;
use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::error::AuctionError;

/// Everything the engine needs to PING and POST one buyer for one service.
#[derive(Debug, Clone)]
pub struct BuyerAuctionConfig {
    pub buyer_id: DbId,
    pub buyer_name: String,
    pub config_id: DbId,
    pub service_type_id: DbId,
    /// Config `ping_url`, else the buyer's `api_url`.
    pub ping_url: Option<String>,
    /// Config `post_url`, else the buyer's `api_url`.
    pub post_url: Option<String>,
    pub ping_template: Value,
    pub post_template: Value,
    pub field_mappings: Value,
    pub requirements: ComplianceRequirements,
    pub min_bid: f64,
    pub max_bid: f64,
    pub auth: BuyerAuthConfig,
    pub webhook_secret: Option<String>,
    pub ping_timeout: Duration,
    pub post_timeout: Duration,
}

impl BuyerAuctionConfig {
    /// Build from a joined row, parsing the stored credentials.
    pub fn from_row(row: AuctionConfigRow) -> Result<Self, AuctionError> {
        let auth = match &row.auth_config {
            Some(value) => BuyerAuthConfig::from_json(value)?,
            None => BuyerAuthConfig::None,
        };
        let fallback = |url: Option<String>| {
            url.filter(|u| !u.trim().is_empty())
                .or_else(|| row.api_url.clone().filter(|u| !u.trim().is_empty()))
        };

        Ok(Self {
            buyer_id: row.buyer_id,
            buyer_name: row.buyer_name.clone(),
            config_id: row.config_id,
            service_type_id: row.service_type_id,
            ping_url: fallback(row.ping_url.clone()),
            post_url: fallback(row.post_url.clone()),
            ping_template: row.ping_template.unwrap_or(Value::Null),
            post_template: row.post_template.unwrap_or(Value::Null),
            field_mappings: row.field_mappings.unwrap_or(Value::Null),
            requirements: ComplianceRequirements {
                requires_trusted_form: row.requires_trusted_form,
                requires_jornaya: row.requires_jornaya,
            },
            min_bid: row.min_bid,
            max_bid: row.max_bid,
            auth,
            webhook_secret: row.webhook_secret.filter(|s| !s.is_empty()),
            ping_timeout: timeout_secs(row.ping_timeout_secs),
            post_timeout: timeout_secs(row.post_timeout_secs),
        })
    }

    /// Bid window after applying optional zone overrides.
    pub fn bounds(&self, zone_min: Option<f64>, zone_max: Option<f64>) -> BidBounds {
        BidBounds::resolve(self.min_bid, self.max_bid, zone_min, zone_max)
    }
}

fn timeout_secs(secs: i32) -> Duration {
    Duration::from_secs(u64::try_from(secs).unwrap_or(1).max(1))
}

struct CachedConfig {
    config: Option<Arc<BuyerAuctionConfig>>,
    loaded_at: Instant,
}

/// TTL cache of [`BuyerAuctionConfig`] keyed by `(buyer_id, service_type_id)`.
///
/// Missing or inactive configurations are cached as `None` too.
pub struct BuyerConfigurationRegistry {
    pool: PgPool,
    ttl: Duration,
    entries: RwLock<HashMap<(DbId, DbId), CachedConfig>>,
}

impl BuyerConfigurationRegistry {
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self {
            pool,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the configuration, loading it when absent or expired.
    pub async fn get(
        &self,
        buyer_id: DbId,
        service_type_id: DbId,
    ) -> Result<Option<Arc<BuyerAuctionConfig>>, AuctionError> {
        let key = (buyer_id, service_type_id);
        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(&key) {
                if cached.loaded_at.elapsed() < self.ttl {
                    return Ok(cached.config.clone());
                }
            }
        }

        let config = BuyerServiceConfigRepo::find_auction_config(&self.pool, buyer_id, service_type_id)
            .await?
            .map(BuyerAuctionConfig::from_row)
            .transpose()?
            .map(Arc::new);

        tracing::debug!(
            buyer_id,
            service_type_id,
            found = config.is_some(),
            "Buyer auction config loaded",
        );

        self.entries.write().await.insert(
            key,
            CachedConfig {
                config: config.clone(),
                loaded_at: Instant::now(),
            },
        );
        Ok(config)
    }

    /// Drop every cached entry for a buyer.
    pub async fn invalidate_buyer(&self, buyer_id: DbId) {
        self.entries
            .write()
            .await
            .retain(|(cached_buyer, _), _| *cached_buyer != buyer_id);
        tracing::debug!(buyer_id, "Buyer auction config invalidated");
    }

    /// Drop every cached entry.
    pub async fn invalidate_all(&self) {
        self.entries.write().await.clear();
    }

    /// Number of cached entries, fresh or not.
    pub async fn cached_len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn row() -> AuctionConfigRow {
        AuctionConfigRow {
            buyer_id: 7,
            buyer_name: "Acme".into(),
            api_url: Some("https://acme.test/api".into()),
            auth_config: Some(json!({ "type": "bearer", "token": "abc" })),
            webhook_secret: Some("s3cret".into()),
            ping_timeout_secs: 3,
            post_timeout_secs: 0,
            config_id: 11,
            service_type_id: 2,
            ping_url: Some("https://acme.test/ping".into()),
            post_url: None,
            ping_template: None,
            post_template: Some(json!({ "zip": "{{zip_code}}" })),
            field_mappings: None,
            requires_trusted_form: true,
            requires_jornaya: false,
            min_bid: 10.0,
            max_bid: 40.0,
        }
    }

    #[test]
    fn urls_fall_back_to_api_url() {
        let cfg = BuyerAuctionConfig::from_row(row()).unwrap();
        assert_eq!(cfg.ping_url.as_deref(), Some("https://acme.test/ping"));
        assert_eq!(cfg.post_url.as_deref(), Some("https://acme.test/api"));
    }

    #[test]
    fn timeouts_are_at_least_one_second() {
        let cfg = BuyerAuctionConfig::from_row(row()).unwrap();
        assert_eq!(cfg.ping_timeout, Duration::from_secs(3));
        assert_eq!(cfg.post_timeout, Duration::from_secs(1));
    }

    #[test]
    fn parses_credentials_and_requirements() {
        let cfg = BuyerAuctionConfig::from_row(row()).unwrap();
        assert_eq!(cfg.auth, BuyerAuthConfig::Bearer { token: "abc".into() });
        assert!(cfg.requirements.requires_trusted_form);
        assert!(!cfg.requirements.requires_jornaya);
        assert_eq!(cfg.ping_template, Value::Null);
    }

    #[test]
    fn invalid_credentials_are_a_configuration_error() {
        let mut bad = row();
        bad.auth_config = Some(json!({ "type": "carrier_pigeon" }));
        assert_matches!(
            BuyerAuctionConfig::from_row(bad),
            Err(AuctionError::Configuration(_))
        );
    }

    #[test]
    fn zone_overrides_replace_config_bounds() {
        let cfg = BuyerAuctionConfig::from_row(row()).unwrap();
        let b = cfg.bounds(Some(15.0), None);
        assert_eq!((b.min_bid, b.max_bid), (15.0, 40.0));
        let inverted = cfg.bounds(Some(50.0), Some(20.0));
        assert_eq!((inverted.min_bid, inverted.max_bid), (10.0, 40.0));
    }
}
