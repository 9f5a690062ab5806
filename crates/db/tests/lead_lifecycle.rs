//! Integration tests for lead claiming, final-state immutability, the
//! one-POST-per-lead index, and the append-only audit log.

use leadbid_core::compliance::ComplianceTokens;
use leadbid_core::status::{
    BuyerType, ComplianceEvent, LeadStatus, TransactionAction, TransactionStatus,
};
use leadbid_db::models::buyer::CreateBuyer;
use leadbid_db::models::compliance_audit::CreateComplianceAuditEntry;
use leadbid_db::models::lead::{CreateLead, LeadFilter};
use leadbid_db::models::service_type::CreateServiceType;
use leadbid_db::models::transaction::{CreateTransaction, TransactionFilter};
use leadbid_db::repositories::{
    BuyerRepo, ComplianceAuditRepo, LeadRepo, ServiceTypeRepo, TransactionRepo,
};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed(pool: &PgPool) -> (i64, i64) {
    let st = ServiceTypeRepo::create(
        pool,
        &CreateServiceType {
            name: "roofing".to_string(),
            display_name: "Roofing".to_string(),
            form_schema: None,
            is_active: None,
        },
    )
    .await
    .unwrap();
    let buyer = BuyerRepo::create(
        pool,
        &CreateBuyer {
            name: "Acme".to_string(),
            buyer_type: BuyerType::Contractor,
            api_url: None,
            auth_config: None,
            ping_timeout_secs: None,
            post_timeout_secs: None,
            is_active: None,
            company_name: None,
            contact_name: None,
            contact_email: None,
            contact_phone: None,
        },
        "secret",
    )
    .await
    .unwrap();
    (st.id, buyer.id)
}

fn new_lead(service_type_id: i64) -> CreateLead {
    CreateLead {
        service_type_id,
        form_data: json!({ "first_name": "Ann", "roof_type": "shingle" }),
        zip_code: "90210".to_string(),
        owns_home: Some(true),
        timeframe: Some("1-3 months".to_string()),
        compliance: ComplianceTokens {
            trusted_form_cert_url: Some("https://cert.trustedform.com/abc".to_string()),
            trusted_form_cert_id: Some("abc".to_string()),
            jornaya_lead_id: None,
        },
        compliance_data: None,
        lead_quality_score: 60,
        tcpa_consent: true,
        tcpa_consent_text: Some("I agree".to_string()),
    }
}

fn ping(lead_id: i64, buyer_id: i64, action: TransactionAction) -> CreateTransaction {
    CreateTransaction {
        lead_id,
        buyer_id,
        action_type: action,
        status: TransactionStatus::Success,
        bid_amount: Some(25.0),
        response_time_ms: Some(120),
        error_message: None,
        request_payload: Some(json!({ "zip": "90210" })),
        response_payload: None,
        has_trusted_form: true,
        has_jornaya: false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_claim_next_pending_is_exclusive(pool: PgPool) {
    let (st, _) = seed(&pool).await;
    let first = LeadRepo::create(&pool, &new_lead(st)).await.unwrap();
    let second = LeadRepo::create(&pool, &new_lead(st)).await.unwrap();
    assert_eq!(first.lead_status(), LeadStatus::Pending);

    let a = LeadRepo::claim_next_pending(&pool).await.unwrap().unwrap();
    let b = LeadRepo::claim_next_pending(&pool).await.unwrap().unwrap();
    assert_eq!(a.id, first.id);
    assert_eq!(b.id, second.id);
    assert!(a.auction_started_at.is_some());
    assert!(LeadRepo::claim_next_pending(&pool).await.unwrap().is_none());

    // Already claimed by the dispatcher.
    assert!(LeadRepo::claim_by_id(&pool, first.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stale_claims_are_released(pool: PgPool) {
    let (st, _) = seed(&pool).await;
    let lead = LeadRepo::create(&pool, &new_lead(st)).await.unwrap();
    LeadRepo::claim_by_id(&pool, lead.id).await.unwrap().unwrap();

    sqlx::query("UPDATE leads SET auction_started_at = NOW() - INTERVAL '10 minutes' WHERE id = $1")
        .bind(lead.id)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(LeadRepo::release_stale_claims(&pool, 300).await.unwrap(), 1);
    assert!(LeadRepo::claim_by_id(&pool, lead.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sold_lead_is_immutable(pool: PgPool) {
    let (st, buyer) = seed(&pool).await;
    let lead = LeadRepo::create(&pool, &new_lead(st)).await.unwrap();

    let sold = LeadRepo::mark_sold(&pool, lead.id, buyer, 42.5)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sold.lead_status(), LeadStatus::Sold);
    assert_eq!(sold.winning_buyer_id, Some(buyer));
    assert_eq!(sold.winning_bid, Some(42.5));
    assert!(sold.auction_completed_at.is_some());

    assert!(LeadRepo::mark_rejected(&pool, lead.id, "late")
        .await
        .unwrap()
        .is_none());
    assert!(LeadRepo::mark_sold(&pool, lead.id, buyer, 99.0)
        .await
        .unwrap()
        .is_none());

    let reloaded = LeadRepo::find_by_id(&pool, lead.id).await.unwrap().unwrap();
    assert_eq!(reloaded.winning_bid, Some(42.5));
    assert_eq!(reloaded.rejection_reason, None);

    let filter = LeadFilter {
        status: Some(LeadStatus::Sold),
        ..Default::default()
    };
    assert_eq!(LeadRepo::count(&pool, &filter).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_only_one_post_per_lead(pool: PgPool) {
    let (st, buyer) = seed(&pool).await;
    let lead = LeadRepo::create(&pool, &new_lead(st)).await.unwrap();

    TransactionRepo::create(&pool, &ping(lead.id, buyer, TransactionAction::Ping))
        .await
        .unwrap();
    TransactionRepo::create(&pool, &ping(lead.id, buyer, TransactionAction::Ping))
        .await
        .unwrap();
    TransactionRepo::create(&pool, &ping(lead.id, buyer, TransactionAction::Post))
        .await
        .unwrap();
    let err = TransactionRepo::create(&pool, &ping(lead.id, buyer, TransactionAction::Post))
        .await
        .unwrap_err();
    assert!(err.as_database_error().is_some_and(|e| e.is_unique_violation()));

    let all = TransactionRepo::list_for_lead(&pool, lead.id).await.unwrap();
    assert_eq!(all.len(), 3);

    let filter = TransactionFilter {
        action_type: Some(TransactionAction::Ping),
        ..Default::default()
    };
    assert_eq!(TransactionRepo::count(&pool, &filter).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_audit_log_is_append_only(pool: PgPool) {
    let (st, _) = seed(&pool).await;
    let lead = LeadRepo::create(&pool, &new_lead(st)).await.unwrap();

    let entry = ComplianceAuditRepo::append(
        &pool,
        &CreateComplianceAuditEntry::system(
            lead.id,
            ComplianceEvent::LeadSubmitted,
            json!({ "quality": 60 }),
        ),
    )
    .await
    .unwrap();
    assert_eq!(entry.event_type, "LEAD_SUBMITTED");

    let update = sqlx::query("UPDATE compliance_audit_log SET event_type = 'X' WHERE id = $1")
        .bind(entry.id)
        .execute(&pool)
        .await;
    assert!(update.is_err());

    let delete = sqlx::query("DELETE FROM compliance_audit_log WHERE id = $1")
        .bind(entry.id)
        .execute(&pool)
        .await;
    assert!(delete.is_err());

    let history = ComplianceAuditRepo::list_for_lead(&pool, lead.id).await.unwrap();
    assert_eq!(history.len(), 1);
}
