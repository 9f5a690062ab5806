//! Route definitions for the `/admin` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{buyers, leads, service_configs, service_types, service_zones, transactions};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// GET    /buyers                         -> list_buyers
/// POST   /buyers                         -> create_buyer
/// GET    /buyers/{id}                    -> get_buyer
/// PUT    /buyers/{id}                    -> update_buyer
/// DELETE /buyers/{id}                    -> delete_buyer
/// POST   /buyers/{id}/rotate-secret      -> rotate_secret
/// GET    /buyers/{id}/service-configs    -> list_for_buyer
/// POST   /buyers/{id}/service-configs    -> create_config
///
/// GET    /service-configs/{id}           -> get_config
/// PUT    /service-configs/{id}           -> update_config
/// DELETE /service-configs/{id}           -> delete_config
///
/// GET    /service-zones                  -> list_zones
/// POST   /service-zones                  -> create_zone
/// POST   /service-zones/bulk             -> bulk_create_zones
/// GET    /service-zones/{id}             -> get_zone
/// PUT    /service-zones/{id}             -> update_zone
/// DELETE /service-zones/{id}             -> delete_zone
///
/// GET    /service-types                  -> list_all
/// POST   /service-types                  -> create_service_type
/// PUT    /service-types/{id}             -> update_service_type
///
/// GET    /leads                          -> list_leads
/// GET    /leads/{id}                     -> get_lead
/// POST   /leads/{id}/auction             -> run_auction
/// GET    /leads/{id}/compliance-log      -> compliance_log
///
/// GET    /transactions                   -> list_transactions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/buyers", get(buyers::list_buyers).post(buyers::create_buyer))
        .route(
            "/buyers/{id}",
            get(buyers::get_buyer)
                .put(buyers::update_buyer)
                .delete(buyers::delete_buyer),
        )
        .route("/buyers/{id}/rotate-secret", post(buyers::rotate_secret))
        .route(
            "/buyers/{id}/service-configs",
            get(service_configs::list_for_buyer).post(service_configs::create_config),
        )
        .route(
            "/service-configs/{id}",
            get(service_configs::get_config)
                .put(service_configs::update_config)
                .delete(service_configs::delete_config),
        )
        .route(
            "/service-zones",
            get(service_zones::list_zones).post(service_zones::create_zone),
        )
        .route("/service-zones/bulk", post(service_zones::bulk_create_zones))
        .route(
            "/service-zones/{id}",
            get(service_zones::get_zone)
                .put(service_zones::update_zone)
                .delete(service_zones::delete_zone),
        )
        .route(
            "/service-types",
            get(service_types::list_all).post(service_types::create_service_type),
        )
        .route(
            "/service-types/{id}",
            axum::routing::put(service_types::update_service_type),
        )
        .route("/leads", get(leads::list_leads))
        .route("/leads/{id}", get(leads::get_lead))
        .route("/leads/{id}/auction", post(leads::run_auction))
        .route("/leads/{id}/compliance-log", get(leads::compliance_log))
        .route("/transactions", get(transactions::list_transactions))
}
