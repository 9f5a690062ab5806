//! Domain logic for the leadbid marketplace.
//!
//! This crate has no I/O: it holds the shared types, error enum, and the
//! pure rules (bid clamping, compliance gating, payload templates, webhook
//! signatures) used by the database, auction, and API crates.

pub mod auth_config;
pub mod bidding;
pub mod compliance;
pub mod error;
pub mod hashing;
pub mod search;
pub mod status;
pub mod templates;
pub mod types;
pub mod webhook_signature;
pub mod zip_code;
