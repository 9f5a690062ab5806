use leadbid_auction::AuctionConfig;
use leadbid_core::webhook_signature::DEFAULT_MAX_AGE_SECS;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for background tasks after the listener closes.
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Key exchanged for an admin JWT at `POST /auth/token`. When unset the
    /// exchange endpoint refuses every request.
    pub admin_api_key: Option<String>,
    /// Replay window for signed buyer callbacks.
    pub webhook_max_age_secs: i64,
    /// Auction engine and dispatcher tuning.
    pub auction: AuctionConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `ADMIN_API_KEY`         | unset                   |
    /// | `WEBHOOK_MAX_AGE_SECS`  | `300`                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let admin_api_key = std::env::var("ADMIN_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let webhook_max_age_secs: i64 = std::env::var("WEBHOOK_MAX_AGE_SECS")
            .unwrap_or_else(|_| DEFAULT_MAX_AGE_SECS.to_string())
            .parse()
            .expect("WEBHOOK_MAX_AGE_SECS must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            admin_api_key,
            webhook_max_age_secs,
            auction: AuctionConfig::from_env(),
        }
    }
}
