//! `HttpBuyerTransport` against a local buyer endpoint.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use leadbid_auction::{BuyerRequest, BuyerTransport, HttpBuyerTransport, TransportError};
use leadbid_core::auth_config::BuyerAuthConfig;
use leadbid_core::status::TransactionAction;
use leadbid_core::webhook_signature::{verify_webhook_signature, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
struct Captured {
    headers: HeaderMap,
    body: String,
}

type Seen = Arc<Mutex<Vec<Captured>>>;

async fn capture(State(seen): State<Seen>, headers: HeaderMap, body: String) -> Json<Value> {
    seen.lock().unwrap().push(Captured { headers, body });
    Json(json!({ "bid": 31.5, "ping_id": "srv-1" }))
}

async fn refuse() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": "zip not served" })),
    )
}

async fn plain() -> &'static str {
    "OK"
}

async fn start_buyer() -> (String, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/ping", post(capture))
        .route("/refuse", post(refuse))
        .route("/plain", post(plain))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

fn request(url: String, auth: BuyerAuthConfig, signing_secret: Option<&str>) -> BuyerRequest {
    BuyerRequest {
        action: TransactionAction::Ping,
        url,
        payload: json!({ "zip_code": "90210", "roof_type": "metal" }),
        auth,
        signing_secret: signing_secret.map(str::to_string),
    }
}

#[tokio::test]
async fn test_sends_signed_json_with_bearer_auth() {
    let (base, seen) = start_buyer().await;
    let transport = HttpBuyerTransport::new().unwrap();

    let response = transport
        .send(request(
            format!("{base}/ping"),
            BuyerAuthConfig::Bearer {
                token: "tok-123".into(),
            },
            Some("shared-secret"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "bid": 31.5, "ping_id": "srv-1" }));

    let captured = seen.lock().unwrap()[0].clone();
    assert_eq!(
        captured.headers.get("authorization").unwrap(),
        "Bearer tok-123"
    );
    assert_eq!(
        captured.headers.get("content-type").unwrap(),
        "application/json"
    );
    assert!(captured.headers.contains_key(TIMESTAMP_HEADER));
    let signature = captured.headers.get(SIGNATURE_HEADER).unwrap().to_str().unwrap();
    assert!(verify_webhook_signature(&captured.body, signature, "shared-secret"));
    let body: Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(body["zip_code"], "90210");
}

#[tokio::test]
async fn test_custom_headers_and_no_signature_without_secret() {
    let (base, seen) = start_buyer().await;
    let transport = HttpBuyerTransport::new().unwrap();
    let headers = BTreeMap::from([
        ("x-partner-id".to_string(), "77".to_string()),
        ("x-api-key".to_string(), "k-1".to_string()),
    ]);

    transport
        .send(request(
            format!("{base}/ping"),
            BuyerAuthConfig::Headers { headers },
            None,
        ))
        .await
        .unwrap();

    let captured = seen.lock().unwrap()[0].clone();
    assert_eq!(captured.headers.get("x-partner-id").unwrap(), "77");
    assert_eq!(captured.headers.get("x-api-key").unwrap(), "k-1");
    assert!(!captured.headers.contains_key(SIGNATURE_HEADER));
    assert!(!captured.headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_non_success_status_keeps_body() {
    let (base, _) = start_buyer().await;
    let transport = HttpBuyerTransport::new().unwrap();

    let err = transport
        .send(request(format!("{base}/refuse"), BuyerAuthConfig::None, None))
        .await
        .unwrap_err();

    assert_matches!(err, TransportError::HttpStatus { status: 422, .. });
    assert_eq!(err.response_body(), Some(&json!({ "error": "zip not served" })));
}

#[tokio::test]
async fn test_plain_text_body_is_kept_as_string() {
    let (base, _) = start_buyer().await;
    let transport = HttpBuyerTransport::new().unwrap();

    let response = transport
        .send(request(format!("{base}/plain"), BuyerAuthConfig::None, None))
        .await
        .unwrap();
    assert_eq!(response.body, json!("OK"));
}

#[tokio::test]
async fn test_unreachable_buyer_is_request_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HttpBuyerTransport::new().unwrap();
    let err = transport
        .send(request(format!("http://{addr}/ping"), BuyerAuthConfig::None, None))
        .await
        .unwrap_err();
    assert_matches!(err, TransportError::Request(_));
}
