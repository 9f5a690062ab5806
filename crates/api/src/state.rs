use std::sync::Arc;

use leadbid_auction::{AuctionEngine, BuyerConfigurationRegistry, HttpBuyerTransport};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference counted and everything else is
/// behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: leadbid_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Auction engine shared with the background dispatcher.
    pub auction: Arc<AuctionEngine<HttpBuyerTransport>>,
}

impl AppState {
    /// Buyer configuration cache; admin writes invalidate it.
    pub fn registry(&self) -> &BuyerConfigurationRegistry {
        self.auction.registry()
    }
}
