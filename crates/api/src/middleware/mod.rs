//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the caller from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`request_meta::RequestMeta`] -- Caller IP and user agent for audit rows.

pub mod auth;
pub mod rbac;
pub mod request_meta;
