//! HTTP-level tests for signed buyer lead-status callbacks.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{body_json, lead_body, post_json, post_raw, seed_service_type};
use leadbid_core::status::BuyerType;
use leadbid_core::webhook_signature::{generate_webhook_signature, SIGNATURE_HEADER};
use leadbid_db::models::buyer::CreateBuyer;
use leadbid_db::repositories::{BuyerRepo, LeadRepo};
use serde_json::json;
use sqlx::PgPool;

const SECRET: &str = "buyer-signing-secret";

async fn create_buyer(pool: &PgPool, name: &str) -> i64 {
    let input = CreateBuyer {
        name: name.to_string(),
        buyer_type: BuyerType::Network,
        api_url: None,
        auth_config: None,
        ping_timeout_secs: None,
        post_timeout_secs: None,
        is_active: Some(true),
        company_name: None,
        contact_name: None,
        contact_email: None,
        contact_phone: None,
    };
    BuyerRepo::create(pool, &input, SECRET).await.unwrap().id
}

/// A lead sold to `buyer_id`.
async fn sold_lead(pool: &PgPool, buyer_id: i64) -> i64 {
    let service_type_id = seed_service_type(pool, "roofing").await;
    let app = common::build_test_app(pool.clone());
    let response = post_json(app, "/api/v1/leads", lead_body(service_type_id)).await;
    let lead_id = body_json(response).await["data"]["lead_id"].as_i64().unwrap();
    LeadRepo::mark_sold(pool, lead_id, buyer_id, 25.0)
        .await
        .unwrap()
        .expect("lead should be pending");
    lead_id
}

fn signed(body: &str, secret: &str) -> String {
    generate_webhook_signature(body, secret)
}

/// A correctly signed, fresh callback from the winning buyer is recorded.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_callback_recorded(pool: PgPool) {
    let buyer_id = create_buyer(&pool, "Winner").await;
    let lead_id = sold_lead(&pool, buyer_id).await;

    let body = json!({
        "lead_id": lead_id,
        "status": "CONTACTED",
        "timestamp": Utc::now().timestamp(),
        "notes": "left voicemail",
    })
    .to_string();
    let signature = signed(&body, SECRET);

    let app = common::build_test_app(pool.clone());
    let response = post_raw(
        app,
        &format!("/api/v1/webhooks/buyers/{buyer_id}/lead-status"),
        body,
        &[(SIGNATURE_HEADER, signature.as_str()), ("x-real-ip", "198.51.100.4")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(response).await["data"]["lead_id"], lead_id);

    let (event_data, ip): (serde_json::Value, Option<String>) = sqlx::query_as(
        "SELECT event_data, ip_address FROM compliance_audit_log \
         WHERE lead_id = $1 AND event_type = 'BUYER_FEEDBACK'",
    )
    .bind(lead_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(event_data["status"], "CONTACTED");
    assert_eq!(event_data["notes"], "left voicemail");
    assert_eq!(ip.as_deref(), Some("198.51.100.4"));
}

/// A wrong or missing signature is 401.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_callback_bad_signature(pool: PgPool) {
    let buyer_id = create_buyer(&pool, "Winner").await;
    let lead_id = sold_lead(&pool, buyer_id).await;
    let uri = format!("/api/v1/webhooks/buyers/{buyer_id}/lead-status");
    let body = json!({ "lead_id": lead_id, "status": "CONTACTED", "timestamp": Utc::now().timestamp() })
        .to_string();

    let forged = signed(&body, "someone-elses-secret");
    let app = common::build_test_app(pool.clone());
    let response = post_raw(app, &uri, body.clone(), &[(SIGNATURE_HEADER, forged.as_str())]).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let app = common::build_test_app(pool);
    let response = post_raw(app, &uri, body, &[]).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Timestamps outside the replay window are refused even when signed.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_callback_replay_window(pool: PgPool) {
    let buyer_id = create_buyer(&pool, "Winner").await;
    let lead_id = sold_lead(&pool, buyer_id).await;
    let uri = format!("/api/v1/webhooks/buyers/{buyer_id}/lead-status");

    for timestamp in [Utc::now().timestamp() - 3_600, Utc::now().timestamp() + 3_600] {
        let body = json!({ "lead_id": lead_id, "status": "CONTACTED", "timestamp": timestamp })
            .to_string();
        let signature = signed(&body, SECRET);
        let app = common::build_test_app(pool.clone());
        let response = post_raw(app, &uri, body, &[(SIGNATURE_HEADER, signature.as_str())]).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

/// Only the winning buyer may report on a lead.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_callback_from_losing_buyer(pool: PgPool) {
    let winner = create_buyer(&pool, "Winner").await;
    let other = create_buyer(&pool, "Other").await;
    let lead_id = sold_lead(&pool, winner).await;

    let body = json!({ "lead_id": lead_id, "status": "CONTACTED", "timestamp": Utc::now().timestamp() })
        .to_string();
    let signature = signed(&body, SECRET);

    let app = common::build_test_app(pool.clone());
    let response = post_raw(
        app,
        &format!("/api/v1/webhooks/buyers/{other}/lead-status"),
        body,
        &[(SIGNATURE_HEADER, signature.as_str())],
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM compliance_audit_log WHERE event_type = 'BUYER_FEEDBACK'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 0);
}
