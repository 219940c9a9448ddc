//! DbService smoke tests: on-disk engine, schema constraints, admin seed.

use backoffice_server::db::DbService;
use backoffice_server::db::models::PriceItemCreate;
use backoffice_server::db::repository::{PriceItemRepository, UserRepository};

#[tokio::test]
async fn disk_backed_database_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("backoffice.db");
    let db_path = db_path.to_string_lossy();

    {
        let service = DbService::open(&db_path).await.expect("open db");
        let prices = PriceItemRepository::new(service.db.clone());
        prices
            .create(PriceItemCreate {
                name: "Shirt".to_string(),
                pricing_mode: backoffice_server::db::models::PricingMode::PerPiece,
                point_multiplier: Some(1),
                unit_price: 630.0,
            })
            .await
            .expect("create price item");
    }

    // Reopen and verify persistence
    let service = DbService::open(&db_path).await.expect("reopen db");
    let prices = PriceItemRepository::new(service.db.clone());
    let found = prices.find_by_name("Shirt").await.expect("query");
    assert!(found.is_some());
    assert_eq!(found.unwrap().unit_price, 630.0);
}

#[tokio::test]
async fn duplicate_price_name_rejected() {
    let service = DbService::memory().await.expect("memory db");
    let prices = PriceItemRepository::new(service.db.clone());

    let item = PriceItemCreate {
        name: "Blanket".to_string(),
        pricing_mode: backoffice_server::db::models::PricingMode::Flat,
        point_multiplier: None,
        unit_price: 10_300.0,
    };
    prices.create(item.clone()).await.expect("first create");
    let err = prices.create(item).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn default_admin_seed_is_idempotent() {
    let service = DbService::memory().await.expect("memory db");

    service
        .ensure_default_admin("admin@localhost", "change-me-now")
        .await
        .expect("first seed");
    // Second call is a no-op, not a duplicate error
    service
        .ensure_default_admin("admin@localhost", "change-me-now")
        .await
        .expect("second seed");

    let users = UserRepository::new(service.db.clone());
    let admin = users
        .find_by_email("admin@localhost")
        .await
        .expect("query")
        .expect("admin exists");
    assert!(admin.verify_password("change-me-now").expect("verify"));
    assert_eq!(admin.role, backoffice_server::db::models::Role::Admin);

    let (_, total) = users.find_page(10, 0).await.expect("page");
    assert_eq!(total, 1);
}
