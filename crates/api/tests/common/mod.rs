#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use leadbid_api::auth::jwt::{generate_access_token, JwtConfig};
use leadbid_api::auth::ROLE_ADMIN;
use leadbid_api::config::ServerConfig;
use leadbid_api::router::build_app_router;
use leadbid_api::state::AppState;
use leadbid_auction::{AuctionConfig, AuctionEngine, BuyerConfigurationRegistry, HttpBuyerTransport};
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_ADMIN_API_KEY: &str = "test-admin-api-key";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-jwt-secret-that-is-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
        admin_api_key: Some(TEST_ADMIN_API_KEY.to_string()),
        webhook_max_age_secs: 300,
        auction: AuctionConfig {
            config_cache_ttl: Duration::from_secs(60),
            ..AuctionConfig::default()
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// Goes through [`build_app_router`] so integration tests exercise the same
/// middleware stack (CORS, request ID, timeout, tracing, panic recovery) that
/// production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

/// Like [`build_test_app`] with a caller-supplied configuration.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let registry = Arc::new(BuyerConfigurationRegistry::new(
        pool.clone(),
        config.auction.config_cache_ttl,
    ));
    let transport = HttpBuyerTransport::new().expect("HTTP client should build");
    let engine = Arc::new(AuctionEngine::new(
        pool.clone(),
        registry,
        transport,
        &config.auction,
    ));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        auction: engine,
    };
    build_app_router(state, &config)
}

/// A valid admin access token signed with the test secret.
pub fn admin_token() -> String {
    generate_access_token("test-admin", ROLE_ADMIN, &test_config().jwt)
        .expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("router should respond")
}

fn json_request(method: &str, uri: &str, body: serde_json::Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request should build");
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request("POST", uri, body, None)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request("POST", uri, body, Some(token))).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request("PUT", uri, body, Some(token))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request should build");
    send(app, request).await
}

/// POST a raw body with extra headers.
pub async fn post_raw(
    app: Router,
    uri: &str,
    body: String,
    headers: &[(&str, &str)],
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::from(body)).expect("request should build");
    send(app, request).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

// ---------------------------------------------------------------------------
// Seed helpers
// ---------------------------------------------------------------------------

/// Insert an active service type and return its id.
pub async fn seed_service_type(pool: &PgPool, name: &str) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO service_types (name, display_name) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(name.to_uppercase())
    .fetch_one(pool)
    .await
    .expect("service type insert should succeed");
    id
}

/// Insert a zip code reference row.
pub async fn seed_zip_code(pool: &PgPool, zip: &str, city: &str, state: &str) {
    sqlx::query("INSERT INTO zip_codes (zip_code, city, state) VALUES ($1, $2, $3)")
        .bind(zip)
        .bind(city)
        .bind(state)
        .execute(pool)
        .await
        .expect("zip code insert should succeed");
}

/// A consumer lead body that passes intake validation.
pub fn lead_body(service_type_id: i64) -> serde_json::Value {
    serde_json::json!({
        "service_type_id": service_type_id,
        "zip_code": "90210-1234",
        "form_data": {
            "first_name": "Pat",
            "last_name": "Doe",
            "email": "pat@example.com",
            "phone": "5551234567",
            "roof_type": "shingle"
        },
        "owns_home": true,
        "timeframe": "1-3 months",
        "trusted_form_cert_url": "https://cert.trustedform.com/0123456789abcdef0123456789abcdef01234567",
        "tcpa_consent": true,
        "tcpa_consent_text": "I agree to be contacted."
    })
}
