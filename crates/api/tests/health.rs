//! Tests for the root-level health endpoint.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_health_reports_database(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
    assert_eq!(json["cached_buyer_configs"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_route_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
