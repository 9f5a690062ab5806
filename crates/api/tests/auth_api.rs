//! HTTP-level tests for the admin token exchange and RBAC enforcement.

mod common;

use axum::http::StatusCode;
use common::{admin_token, body_json, get, get_auth, post_json, test_config, TEST_ADMIN_API_KEY};
use leadbid_api::auth::jwt::{generate_access_token, validate_token};
use sqlx::PgPool;

/// The configured API key is exchanged for an admin JWT.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_issue_token_with_valid_key(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/token",
        serde_json::json!({ "api_key": TEST_ADMIN_API_KEY }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["token_type"], "Bearer");
    assert_eq!(json["data"]["expires_in"], 15 * 60);

    let token = json["data"]["access_token"].as_str().unwrap();
    let claims = validate_token(token, &test_config().jwt).unwrap();
    assert_eq!(claims.role, "admin");
}

/// A wrong key is rejected with 401.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_issue_token_with_wrong_key(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/token",
        serde_json::json!({ "api_key": "not-the-key" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

/// Admin routes need a bearer token.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_route_requires_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/admin/buyers").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A garbage token is rejected.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_route_rejects_invalid_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/admin/buyers", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A valid token without the admin role is forbidden.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_route_rejects_non_admin_role(pool: PgPool) {
    let token = generate_access_token("someone", "viewer", &test_config().jwt).unwrap();
    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/admin/buyers", &token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
}

/// An admin token reaches admin routes.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_route_accepts_admin_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/admin/buyers", &admin_token()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total_count"], 0);
}
