//! Public consumer-facing routes: lead intake, quiz data, contractor signup.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{contractors, leads, locations, service_types};
use crate::state::AppState;

/// Routes mounted at the API root.
///
/// ```text
/// POST /leads                  -> submit_lead
/// GET  /service-types          -> list_active
/// GET  /locations/search       -> search_locations
/// POST /contractors/signup     -> signup
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/leads", post(leads::submit_lead))
        .route("/service-types", get(service_types::list_active))
        .route("/locations/search", get(locations::search_locations))
        .route("/contractors/signup", post(contractors::signup))
}
