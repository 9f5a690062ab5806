//! Integration tests for buyers, service configs, and zip coverage.

use leadbid_core::status::BuyerType;
use leadbid_db::models::buyer::{BuyerFilter, CreateBuyer, UpdateBuyer};
use leadbid_db::models::buyer_service_config::CreateBuyerServiceConfig;
use leadbid_db::models::service_type::CreateServiceType;
use leadbid_db::models::service_zone::{BulkCreateServiceZones, CreateServiceZone};
use leadbid_db::repositories::{
    BuyerRepo, BuyerServiceConfigRepo, ServiceTypeRepo, ServiceZoneRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_buyer(name: &str, email: &str) -> CreateBuyer {
    CreateBuyer {
        name: name.to_string(),
        buyer_type: BuyerType::Contractor,
        api_url: Some("https://buyer.example.com/leads".to_string()),
        auth_config: None,
        ping_timeout_secs: None,
        post_timeout_secs: None,
        is_active: None,
        company_name: Some(format!("{name} LLC")),
        contact_name: None,
        contact_email: Some(email.to_string()),
        contact_phone: None,
    }
}

fn new_config(service_type_id: i64) -> CreateBuyerServiceConfig {
    CreateBuyerServiceConfig {
        service_type_id,
        ping_url: None,
        post_url: None,
        ping_template: None,
        post_template: None,
        field_mappings: None,
        requires_trusted_form: None,
        requires_jornaya: None,
        min_bid: 10.0,
        max_bid: 50.0,
        is_active: None,
    }
}

async fn seed_service_type(pool: &PgPool, name: &str) -> i64 {
    ServiceTypeRepo::create(
        pool,
        &CreateServiceType {
            name: name.to_string(),
            display_name: name.to_uppercase(),
            form_schema: None,
            is_active: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn zips(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Buyers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_buyer_defaults_and_filtering(pool: PgPool) {
    let buyer = BuyerRepo::create(&pool, &new_buyer("Acme Roofing", "ops@acme.test"), "s3cret")
        .await
        .unwrap();
    assert_eq!(buyer.buyer_type, "CONTRACTOR");
    assert_eq!(buyer.ping_timeout_secs, 5);
    assert_eq!(buyer.post_timeout_secs, 10);
    assert!(buyer.is_active);
    assert_eq!(buyer.webhook_secret.as_deref(), Some("s3cret"));

    let mut network = new_buyer("Lead Net", "hello@leadnet.test");
    network.buyer_type = BuyerType::Network;
    BuyerRepo::create(&pool, &network, "x").await.unwrap();

    let filter = BuyerFilter {
        buyer_type: Some(BuyerType::Network),
        ..Default::default()
    };
    let networks = BuyerRepo::list(&pool, &filter, 50, 0).await.unwrap();
    assert_eq!(networks.len(), 1);
    assert_eq!(networks[0].name, "Lead Net");

    let filter = BuyerFilter {
        search: Some("acme".to_string()),
        ..Default::default()
    };
    assert_eq!(BuyerRepo::count(&pool, &filter).await.unwrap(), 1);
    assert_eq!(
        BuyerRepo::count(&pool, &BuyerFilter::default()).await.unwrap(),
        2
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_buyer_contact_email_is_unique_case_insensitive(pool: PgPool) {
    BuyerRepo::create(&pool, &new_buyer("A", "Same@Mail.test"), "x")
        .await
        .unwrap();
    let err = BuyerRepo::create(&pool, &new_buyer("B", "same@mail.test"), "x")
        .await
        .unwrap_err();
    assert!(err.as_database_error().is_some_and(|e| e.is_unique_violation()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_buyer_update_and_references(pool: PgPool) {
    let st = seed_service_type(&pool, "roofing").await;
    let buyer = BuyerRepo::create(&pool, &new_buyer("Acme", "a@acme.test"), "x")
        .await
        .unwrap();

    let updated = BuyerRepo::update(
        &pool,
        buyer.id,
        &UpdateBuyer {
            ping_timeout_secs: Some(3),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.ping_timeout_secs, 3);
    assert_eq!(updated.name, "Acme");

    let refs = BuyerRepo::references(&pool, buyer.id).await.unwrap();
    assert!(!refs.is_referenced());

    BuyerServiceConfigRepo::create(&pool, buyer.id, &new_config(st))
        .await
        .unwrap();
    let refs = BuyerRepo::references(&pool, buyer.id).await.unwrap();
    assert_eq!(refs.config_count, 1);
    assert!(refs.is_referenced());

    assert!(BuyerRepo::deactivate(&pool, buyer.id).await.unwrap());
    let found = BuyerRepo::find_by_id(&pool, buyer.id).await.unwrap().unwrap();
    assert!(!found.is_active);
}

// ---------------------------------------------------------------------------
// Configs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_config_bid_range_and_uniqueness(pool: PgPool) {
    let st = seed_service_type(&pool, "solar").await;
    let buyer = BuyerRepo::create(&pool, &new_buyer("Sun", "s@sun.test"), "x")
        .await
        .unwrap();

    let mut inverted = new_config(st);
    inverted.min_bid = 60.0;
    let err = BuyerServiceConfigRepo::create(&pool, buyer.id, &inverted)
        .await
        .unwrap_err();
    assert!(err.as_database_error().is_some_and(|e| e.is_check_violation()));

    BuyerServiceConfigRepo::create(&pool, buyer.id, &new_config(st))
        .await
        .unwrap();
    let err = BuyerServiceConfigRepo::create(&pool, buyer.id, &new_config(st))
        .await
        .unwrap_err();
    assert!(err.as_database_error().is_some_and(|e| e.is_unique_violation()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_config_delete_refused_while_zip_codes_remain(pool: PgPool) {
    let st = seed_service_type(&pool, "siding").await;
    let buyer = BuyerRepo::create(&pool, &new_buyer("Clad", "c@clad.test"), "x")
        .await
        .unwrap();
    let config = BuyerServiceConfigRepo::create(&pool, buyer.id, &new_config(st))
        .await
        .unwrap();
    let zone = ServiceZoneRepo::create(
        &pool,
        &CreateServiceZone {
            buyer_id: buyer.id,
            service_type_id: st,
            zip_code: "30301".to_string(),
            is_active: None,
            priority: None,
            max_leads_per_day: None,
            min_bid: None,
            max_bid: None,
        },
    )
    .await
    .unwrap();

    assert!(!BuyerServiceConfigRepo::delete_if_no_zip_codes(&pool, config.id)
        .await
        .unwrap());
    assert!(BuyerServiceConfigRepo::find_by_id(&pool, config.id)
        .await
        .unwrap()
        .is_some());

    assert!(ServiceZoneRepo::delete(&pool, zone.id).await.unwrap());
    assert!(BuyerServiceConfigRepo::delete_if_no_zip_codes(&pool, config.id)
        .await
        .unwrap());
    assert!(!BuyerServiceConfigRepo::delete_if_no_zip_codes(&pool, config.id)
        .await
        .unwrap());
}

// ---------------------------------------------------------------------------
// Zones and eligibility candidates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bulk_zones_skip_existing(pool: PgPool) {
    let st = seed_service_type(&pool, "hvac").await;
    let buyer = BuyerRepo::create(&pool, &new_buyer("Cool", "c@cool.test"), "x")
        .await
        .unwrap();

    ServiceZoneRepo::create(
        &pool,
        &CreateServiceZone {
            buyer_id: buyer.id,
            service_type_id: st,
            zip_code: "73301".to_string(),
            is_active: None,
            priority: None,
            max_leads_per_day: None,
            min_bid: None,
            max_bid: None,
        },
    )
    .await
    .unwrap();

    let input = BulkCreateServiceZones {
        buyer_id: buyer.id,
        service_type_id: st,
        zip_codes: vec![],
        priority: Some(500),
        max_leads_per_day: Some(3),
        min_bid: None,
        max_bid: None,
    };
    let result = ServiceZoneRepo::bulk_create(&pool, &input, &zips(&["73301", "73344", "78701"]))
        .await
        .unwrap();
    assert_eq!(result.created.len(), 2);
    assert_eq!(result.skipped_zip_codes, vec!["73301".to_string()]);
    assert!(result.created.iter().all(|z| z.priority == 500));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_candidates_ranked_by_priority_then_buyer(pool: PgPool) {
    let st = seed_service_type(&pool, "windows").await;
    let mut ids = Vec::new();
    for (i, priority) in [100, 300, 300].into_iter().enumerate() {
        let buyer = BuyerRepo::create(&pool, &new_buyer(&format!("B{i}"), &format!("b{i}@x.test")), "x")
            .await
            .unwrap();
        BuyerServiceConfigRepo::create(&pool, buyer.id, &new_config(st))
            .await
            .unwrap();
        ServiceZoneRepo::bulk_create(
            &pool,
            &BulkCreateServiceZones {
                buyer_id: buyer.id,
                service_type_id: st,
                zip_codes: vec![],
                priority: Some(priority),
                max_leads_per_day: None,
                min_bid: None,
                max_bid: None,
            },
            &zips(&["10001"]),
        )
        .await
        .unwrap();
        ids.push(buyer.id);
    }

    // Inactive buyers never appear.
    BuyerRepo::deactivate(&pool, ids[2]).await.unwrap();

    let candidates = ServiceZoneRepo::find_candidates(&pool, st, "10001").await.unwrap();
    let order: Vec<i64> = candidates.iter().map(|c| c.buyer_id).collect();
    assert_eq!(order, vec![ids[1], ids[0]]);
    assert!(candidates.iter().all(|c| c.sold_today == 0));

    assert!(ServiceZoneRepo::find_candidates(&pool, st, "99999")
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Signup transaction
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_signup_creates_everything_or_nothing(pool: PgPool) {
    let roofing = seed_service_type(&pool, "roofing").await;
    let solar = seed_service_type(&pool, "solar").await;

    let records = BuyerRepo::create_with_coverage(
        &pool,
        &new_buyer("Signup Co", "join@signup.test"),
        "secret",
        &[new_config(roofing), new_config(solar)],
        &zips(&["30301", "30302"]),
        100,
    )
    .await
    .unwrap();
    assert_eq!(records.configs.len(), 2);
    assert_eq!(records.zones_created, 4);

    // Second config references a missing service type: nothing is written.
    let before = BuyerRepo::count(&pool, &BuyerFilter::default()).await.unwrap();
    let result = BuyerRepo::create_with_coverage(
        &pool,
        &new_buyer("Broken Co", "broken@signup.test"),
        "secret",
        &[new_config(roofing), new_config(987_654)],
        &zips(&["30303"]),
        100,
    )
    .await;
    assert!(result.is_err());
    let after = BuyerRepo::count(&pool, &BuyerFilter::default()).await.unwrap();
    assert_eq!(before, after);
}
