//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to the repositories in `leadbid_db` (or the auction
//! engine) and map errors via [`AppError`](crate::error::AppError).

pub mod auth;
pub mod buyers;
pub mod contractors;
pub mod leads;
pub mod locations;
pub mod service_configs;
pub mod service_types;
pub mod service_zones;
pub mod transactions;
pub mod webhooks;
