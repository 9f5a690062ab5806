//! Route definitions for inbound buyer callbacks.

use axum::routing::post;
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

/// Routes mounted at `/webhooks`.
///
/// Authenticated by the request signature, not by JWT.
///
/// ```text
/// POST /buyers/{id}/lead-status   -> lead_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/buyers/{id}/lead-status", post(webhooks::lead_status))
}
