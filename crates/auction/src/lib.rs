//! Real-time PING/POST lead auctions.
//!
//! - [`eligibility`] finds and ranks the buyers allowed to bid on a lead.
//! - [`registry`] loads and caches each buyer's per-service configuration.
//! - [`payload`] renders PING/POST bodies from buyer templates.
//! - [`transport`] sends those bodies to buyers over HTTP.
//! - [`engine`] runs one auction end to end.
//! - [`dispatcher`] claims PENDING leads in the background and auctions them.

pub mod config;
pub mod dispatcher;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod payload;
pub mod registry;
pub mod reply;
pub mod transport;

pub use config::AuctionConfig;
pub use dispatcher::AuctionDispatcher;
pub use eligibility::{BuyerEligibilityService, EligibleBuyer};
pub use engine::{AuctionEngine, AuctionResult, AuctionStatus, BidRecord};
pub use error::AuctionError;
pub use registry::{BuyerAuctionConfig, BuyerConfigurationRegistry};
pub use transport::{BuyerRequest, BuyerResponse, BuyerTransport, HttpBuyerTransport, TransportError};
