//! Authentication primitives.
//!
//! - [`api_key`] -- constant-time admin API key comparison.
//! - [`jwt`] -- JWT access-token generation and validation.

pub mod api_key;
pub mod jwt;

/// Role carried by tokens issued through the admin API key exchange.
pub const ROLE_ADMIN: &str = "admin";
