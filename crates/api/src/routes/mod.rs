pub mod admin;
pub mod auth;
pub mod health;
pub mod public;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /leads                                           submit lead (public)
/// /service-types                                   active service types (public)
/// /locations/search                                zip / city search (public)
/// /contractors/signup                              contractor signup (public)
///
/// /webhooks/buyers/{id}/lead-status                signed buyer callback
///
/// /auth/token                                      API key exchange (public)
///
/// /admin/buyers                                    list, create (admin only)
/// /admin/buyers/{id}                               get, update, delete
/// /admin/buyers/{id}/rotate-secret                 rotate signing secret
/// /admin/buyers/{id}/service-configs               list, create
/// /admin/service-configs/{id}                      get, update, delete
/// /admin/service-zones                             list, create
/// /admin/service-zones/bulk                        bulk create
/// /admin/service-zones/{id}                        get, update, delete
/// /admin/service-types                             list (incl. inactive), create
/// /admin/service-types/{id}                        update
/// /admin/leads                                     list
/// /admin/leads/{id}                                detail with transactions
/// /admin/leads/{id}/auction                        run auction now (POST)
/// /admin/leads/{id}/compliance-log                 audit history
/// /admin/transactions                              PING/POST log
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(public::router())
        .nest("/webhooks", webhooks::router())
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
}
