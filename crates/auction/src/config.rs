use std::time::Duration;

/// Auction tuning loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AuctionConfig {
    /// Upper bound on simultaneous PING requests per auction.
    pub max_concurrent_pings: usize,
    /// How long a loaded buyer configuration stays cached.
    pub config_cache_ttl: Duration,
    /// Dispatcher polling interval.
    pub poll_interval: Duration,
    /// Claimed leads still PENDING after this long are released for retry.
    /// Must exceed the longest buyer PING plus POST timeout (180s).
    pub stale_claim_after: Duration,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_pings: 10,
            config_cache_ttl: Duration::from_secs(60),
            poll_interval: Duration::from_millis(1_000),
            stale_claim_after: Duration::from_secs(300),
        }
    }
}

impl AuctionConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default |
    /// |---------------------------------|---------|
    /// | `AUCTION_MAX_CONCURRENT_PINGS`  | `10`    |
    /// | `AUCTION_CONFIG_CACHE_TTL_SECS` | `60`    |
    /// | `AUCTION_POLL_INTERVAL_MS`      | `1000`  |
    /// | `AUCTION_STALE_CLAIM_SECS`      | `300`   |
    pub fn from_env() -> Self {
        let max_concurrent_pings: usize = std::env::var("AUCTION_MAX_CONCURRENT_PINGS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("AUCTION_MAX_CONCURRENT_PINGS must be a valid usize");

        let config_cache_ttl_secs: u64 = std::env::var("AUCTION_CONFIG_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("AUCTION_CONFIG_CACHE_TTL_SECS must be a valid u64");

        let poll_interval_ms: u64 = std::env::var("AUCTION_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .expect("AUCTION_POLL_INTERVAL_MS must be a valid u64");

        let stale_claim_secs: u64 = std::env::var("AUCTION_STALE_CLAIM_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("AUCTION_STALE_CLAIM_SECS must be a valid u64");

        Self {
            max_concurrent_pings: max_concurrent_pings.max(1),
            config_cache_ttl: Duration::from_secs(config_cache_ttl_secs),
            poll_interval: Duration::from_millis(poll_interval_ms.max(10)),
            stale_claim_after: Duration::from_secs(stale_claim_secs),
        }
    }
}
