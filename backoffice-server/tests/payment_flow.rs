//! End-to-end reconciliation flow against an in-memory database.
//!
//! Covers the order pricing + payment reconciliation lifecycle: create,
//! pay, reconcile, correct (delete payment), and the referential guards.

use backoffice_server::db::DbService;
use backoffice_server::db::models::{
    CareLevel, CustomerCreate, DeliveryType, Order, OrderItemInput, OrderStatus, Payment,
    PaymentMethod, PaymentStatus, PriceItemCreate, PricingMode,
};
use backoffice_server::db::repository::{
    CustomerRepository, OrderRepository, PaymentRepository, PriceItemRepository,
    SequenceRepository,
};
use backoffice_server::orders::{reconcile, resolve_items};
use backoffice_server::pricing;
use shared::util::{format_order_number, now_millis};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

struct TestEnv {
    db: Surreal<Db>,
    customers: CustomerRepository,
    catalog: PriceItemRepository,
    orders: OrderRepository,
    payments: PaymentRepository,
    sequences: SequenceRepository,
}

async fn setup() -> TestEnv {
    let service = DbService::memory().await.expect("in-memory db");
    let db = service.db;
    TestEnv {
        customers: CustomerRepository::new(db.clone()),
        catalog: PriceItemRepository::new(db.clone()),
        orders: OrderRepository::new(db.clone()),
        payments: PaymentRepository::new(db.clone()),
        sequences: SequenceRepository::new(db.clone()),
        db,
    }
}

async fn seed_customer(env: &TestEnv) -> String {
    let customer = env
        .customers
        .create(CustomerCreate {
            first_name: "Ana".to_string(),
            last_name: "Suarez".to_string(),
            phone: "555-0101".to_string(),
            email: Some("ana@example.com".to_string()),
            address: "Calle Falsa 123".to_string(),
        })
        .await
        .expect("create customer");
    customer.id.unwrap().to_string()
}

async fn seed_shirt_price(env: &TestEnv) -> String {
    let item = env
        .catalog
        .create(PriceItemCreate {
            name: "Shirt".to_string(),
            pricing_mode: PricingMode::PerPiece,
            point_multiplier: Some(1),
            unit_price: 630.0,
        })
        .await
        .expect("create price item");
    item.id.unwrap().to_string()
}

/// Build and persist an order the way the create handler does
async fn create_order(env: &TestEnv, customer_id: &str, inputs: Vec<OrderItemInput>) -> Order {
    let items = resolve_items(&env.catalog, &inputs).await.expect("resolve");
    let total = pricing::order_total(&items);
    let seq = env.sequences.next("order_number").await.expect("sequence");
    let now = now_millis();
    let customer = env
        .customers
        .find_by_id(customer_id)
        .await
        .expect("find customer")
        .expect("customer exists");

    env.orders
        .create(Order {
            id: None,
            order_number: format_order_number(seq),
            customer_id: customer.id.unwrap(),
            items,
            status: OrderStatus::Received,
            total,
            paid: 0.0,
            payment_status: PaymentStatus::Pending,
            delivery_type: DeliveryType::Standard,
            care_level: CareLevel::Normal,
            note: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("create order")
}

async fn record_payment(env: &TestEnv, order: &Order, amount: f64) -> Payment {
    env.payments
        .create(Payment {
            id: None,
            order_id: order.id.clone().unwrap(),
            amount,
            method: PaymentMethod::Cash,
            created_at: now_millis(),
        })
        .await
        .expect("create payment")
}

#[tokio::test]
async fn end_to_end_pay_and_correct() {
    let env = setup().await;
    let customer_id = seed_customer(&env).await;
    let shirt = seed_shirt_price(&env).await;

    // Shirt: per-piece, multiplier 1, price 630, qty 3 -> total 1890
    let order = create_order(
        &env,
        &customer_id,
        vec![OrderItemInput {
            price_item_id: shirt,
            quantity: 3,
        }],
    )
    .await;
    let order_key = order.id.clone().unwrap().to_string();

    assert_eq!(order.total, 1890.0);
    assert_eq!(order.paid, 0.0);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.order_number, "ORD-000001");

    // Pay in full -> PAID
    record_payment(&env, &order, 1890.0).await;
    let reconciled = reconcile(&env.db, &order_key).await.expect("reconcile");
    assert_eq!(reconciled.paid, 1890.0);
    assert_eq!(reconciled.payment_status, PaymentStatus::Paid);

    // Delete the payment -> back to PENDING
    let ledger = env.payments.list_by_order(&order_key).await.unwrap();
    assert_eq!(ledger.len(), 1);
    let payment_id = ledger[0].id.clone().unwrap().to_string();
    env.payments.delete(&payment_id).await.expect("delete payment");

    let reconciled = reconcile(&env.db, &order_key).await.expect("reconcile");
    assert_eq!(reconciled.paid, 0.0);
    assert_eq!(reconciled.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn paid_equals_ledger_sum_and_partial_transitions() {
    let env = setup().await;
    let customer_id = seed_customer(&env).await;

    // Flat item for round threshold numbers
    let blanket = env
        .catalog
        .create(PriceItemCreate {
            name: "Blanket".to_string(),
            pricing_mode: PricingMode::Flat,
            point_multiplier: None,
            unit_price: 1000.0,
        })
        .await
        .unwrap()
        .id
        .unwrap()
        .to_string();

    let order = create_order(
        &env,
        &customer_id,
        vec![OrderItemInput {
            price_item_id: blanket,
            quantity: 1,
        }],
    )
    .await;
    let order_key = order.id.clone().unwrap().to_string();
    assert_eq!(order.total, 1000.0);

    // 600 + 400 -> PAID
    record_payment(&env, &order, 600.0).await;
    let after_first = reconcile(&env.db, &order_key).await.unwrap();
    assert_eq!(after_first.paid, 600.0);
    assert_eq!(after_first.payment_status, PaymentStatus::Partial);

    record_payment(&env, &order, 400.0).await;
    let after_second = reconcile(&env.db, &order_key).await.unwrap();
    assert_eq!(after_second.paid, 1000.0);
    assert_eq!(after_second.payment_status, PaymentStatus::Paid);

    // paid always equals the full ledger sum
    let ledger = env.payments.list_by_order(&order_key).await.unwrap();
    let sum: f64 = ledger.iter().map(|p| p.amount).sum();
    assert_eq!(after_second.paid, sum);

    // Deleting the 400 entry moves PAID back to PARTIAL
    let entry_400 = ledger.iter().find(|p| p.amount == 400.0).unwrap();
    env.payments
        .delete(&entry_400.id.clone().unwrap().to_string())
        .await
        .unwrap();
    let after_delete = reconcile(&env.db, &order_key).await.unwrap();
    assert_eq!(after_delete.paid, 600.0);
    assert_eq!(after_delete.payment_status, PaymentStatus::Partial);
}

#[tokio::test]
async fn reconcile_is_idempotent() {
    let env = setup().await;
    let customer_id = seed_customer(&env).await;
    let shirt = seed_shirt_price(&env).await;

    let order = create_order(
        &env,
        &customer_id,
        vec![OrderItemInput {
            price_item_id: shirt,
            quantity: 3,
        }],
    )
    .await;
    let order_key = order.id.clone().unwrap().to_string();

    record_payment(&env, &order, 500.0).await;

    let first = reconcile(&env.db, &order_key).await.unwrap();
    let second = reconcile(&env.db, &order_key).await.unwrap();

    // No double counting: a second pass with no ledger change is a no-op
    assert_eq!(first.paid, 500.0);
    assert_eq!(second.paid, 500.0);
    assert_eq!(first.payment_status, second.payment_status);
}

#[tokio::test]
async fn item_update_reprices_and_crosses_threshold() {
    let env = setup().await;
    let customer_id = seed_customer(&env).await;
    let shirt = seed_shirt_price(&env).await;

    let order = create_order(
        &env,
        &customer_id,
        vec![OrderItemInput {
            price_item_id: shirt.clone(),
            quantity: 3,
        }],
    )
    .await;
    let order_key = order.id.clone().unwrap().to_string();
    assert_eq!(order.total, 1890.0);

    // Pay the full original total
    record_payment(&env, &order, 1890.0).await;
    let paid_in_full = reconcile(&env.db, &order_key).await.unwrap();
    assert_eq!(paid_in_full.payment_status, PaymentStatus::Paid);

    // Replace the item set with a larger one: total rises, `paid` is
    // unchanged, so reconciliation must move the status back to PARTIAL.
    let new_items = resolve_items(
        &env.catalog,
        &[OrderItemInput {
            price_item_id: shirt,
            quantity: 5,
        }],
    )
    .await
    .unwrap();
    let new_total = pricing::order_total(&new_items);
    assert_eq!(new_total, 3150.0);

    env.orders
        .set_items(&order_key, new_items, new_total)
        .await
        .unwrap();
    let reconciled = reconcile(&env.db, &order_key).await.unwrap();

    assert_eq!(reconciled.total, 3150.0);
    assert_eq!(reconciled.paid, 1890.0);
    assert_eq!(reconciled.payment_status, PaymentStatus::Partial);
}

#[tokio::test]
async fn order_delete_blocked_while_ledger_references_it() {
    let env = setup().await;
    let customer_id = seed_customer(&env).await;
    let shirt = seed_shirt_price(&env).await;

    let order = create_order(
        &env,
        &customer_id,
        vec![OrderItemInput {
            price_item_id: shirt,
            quantity: 1,
        }],
    )
    .await;
    let order_key = order.id.clone().unwrap().to_string();

    record_payment(&env, &order, 100.0).await;
    reconcile(&env.db, &order_key).await.unwrap();

    // The guard the delete handler enforces
    assert!(env.payments.exists_for_order(&order_key).await.unwrap());

    // After the ledger is emptied the order becomes deletable
    let ledger = env.payments.list_by_order(&order_key).await.unwrap();
    for entry in ledger {
        env.payments
            .delete(&entry.id.unwrap().to_string())
            .await
            .unwrap();
    }
    assert!(!env.payments.exists_for_order(&order_key).await.unwrap());
    assert!(env.orders.delete(&order_key).await.unwrap());
}

#[tokio::test]
async fn customer_delete_blocked_while_orders_reference_it() {
    let env = setup().await;
    let customer_id = seed_customer(&env).await;
    let shirt = seed_shirt_price(&env).await;

    let order = create_order(
        &env,
        &customer_id,
        vec![OrderItemInput {
            price_item_id: shirt,
            quantity: 1,
        }],
    )
    .await;

    assert!(env.orders.exists_for_customer(&customer_id).await.unwrap());

    let order_key = order.id.unwrap().to_string();
    env.orders.delete(&order_key).await.unwrap();
    assert!(!env.orders.exists_for_customer(&customer_id).await.unwrap());
}

#[tokio::test]
async fn unknown_catalog_reference_is_rejected() {
    let env = setup().await;
    let result = resolve_items(
        &env.catalog,
        &[OrderItemInput {
            price_item_id: "price_item:missing".to_string(),
            quantity: 1,
        }],
    )
    .await;

    let err = result.expect_err("unresolvable catalog item must fail");
    assert_eq!(err.code, shared::ErrorCode::OrderItemNotFound);
}

#[tokio::test]
async fn empty_item_set_is_rejected() {
    let env = setup().await;
    let err = resolve_items(&env.catalog, &[]).await.expect_err("empty set");
    assert_eq!(err.code, shared::ErrorCode::OrderEmpty);
}

#[tokio::test]
async fn order_numbers_are_sequential_and_unique() {
    let env = setup().await;
    let customer_id = seed_customer(&env).await;
    let shirt = seed_shirt_price(&env).await;

    let first = create_order(
        &env,
        &customer_id,
        vec![OrderItemInput {
            price_item_id: shirt.clone(),
            quantity: 1,
        }],
    )
    .await;
    let second = create_order(
        &env,
        &customer_id,
        vec![OrderItemInput {
            price_item_id: shirt,
            quantity: 2,
        }],
    )
    .await;

    assert_eq!(first.order_number, "ORD-000001");
    assert_eq!(second.order_number, "ORD-000002");

    let found = env
        .orders
        .find_by_number("ORD-000002")
        .await
        .unwrap()
        .expect("lookup by number");
    assert_eq!(found.id, second.id);
}
