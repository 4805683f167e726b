//! End-to-end payment lifecycle tests against the in-memory store.

use domain::{
    AddLineArgs, Collaborators, DiscountCodes, FeeEntry, Money, PaymentService, PaymentStatus,
    PriceOptionId, ProductId, RemoveLineArgs, StoreSettings,
};
use store::{InMemoryPaymentStore, PaymentStore};

struct Harness {
    service: PaymentService<InMemoryPaymentStore>,
    store: InMemoryPaymentStore,
    catalog: domain::InMemoryCatalog,
    customers: domain::InMemoryCustomerDirectory,
    sales: domain::InMemorySalesLedger,
    discounts: domain::InMemoryDiscountRegistry,
    stats: domain::InMemoryStoreStats,
}

fn harness_with(settings: StoreSettings) -> Harness {
    let store = InMemoryPaymentStore::new();
    let (collaborators, catalog, customers, sales, discounts, stats) = Collaborators::in_memory();
    catalog.add_product(ProductId::new(7), "Starter License", Money::from_cents(2000));
    catalog.add_variable_product(
        ProductId::new(9),
        "Bundle",
        vec![
            (PriceOptionId::new(1), Money::from_cents(5000)),
            (PriceOptionId::new(2), Money::from_cents(1500)),
        ],
    );
    Harness {
        service: PaymentService::new(store.clone(), collaborators, settings),
        store,
        catalog,
        customers,
        sales,
        discounts,
        stats,
    }
}

fn harness() -> Harness {
    harness_with(StoreSettings {
        item_quantities_enabled: true,
        ..Default::default()
    })
}

fn shipping_fee(cents: i64) -> FeeEntry {
    FeeEntry {
        label: "Shipping".to_string(),
        amount: Money::from_cents(cents),
        fee_type: "shipping".to_string(),
        external_id: None,
        no_tax: false,
        product_id: None,
    }
}

#[tokio::test]
async fn test_cart_scenario_totals() {
    let h = harness();
    let mut payment = h.service.new_payment();
    payment.set_email("jane@example.com");

    h.service
        .add_line(
            &mut payment,
            ProductId::new(7),
            AddLineArgs {
                quantity: 2,
                tax: Money::from_cents(400),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(payment.subtotal(), Money::from_cents(4000));
    assert_eq!(payment.tax(), Money::from_cents(400));
    assert_eq!(payment.total(), Money::from_cents(4400));

    payment.add_fee(shipping_fee(500));
    assert_eq!(payment.total(), Money::from_cents(4900));

    payment
        .remove_line(ProductId::new(7), RemoveLineArgs::default())
        .unwrap();
    assert_eq!(payment.subtotal(), Money::from_cents(2000));
    assert_eq!(payment.tax(), Money::from_cents(200));
    assert_eq!(payment.total(), Money::from_cents(2700));

    assert_eq!(
        payment.total(),
        payment.subtotal() + payment.tax() + payment.fees_total()
    );
}

#[tokio::test]
async fn test_publish_counts_sales_and_earnings() {
    let h = harness();
    let mut payment = h.service.new_payment();
    payment.set_email("jane@example.com");
    h.service
        .add_line(
            &mut payment,
            ProductId::new(7),
            AddLineArgs {
                quantity: 2,
                tax: Money::from_cents(400),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    payment.set_status(PaymentStatus::Published);
    h.service.save(&mut payment).await.unwrap();

    let id = payment.id().unwrap();
    assert_eq!(h.sales.sales_of(ProductId::new(7)), 2);
    assert_eq!(h.sales.earnings_of(ProductId::new(7)), Money::from_cents(4400));
    assert_eq!(h.sales.logs_for(id).len(), 2);
    assert_eq!(h.stats.total_earnings(), Money::from_cents(4400));
    assert_eq!(
        h.customers.value_of(payment.customer_id().unwrap()),
        Money::from_cents(4400)
    );
    assert!(payment.completed_at().is_some());
}

#[tokio::test]
async fn test_pending_payment_moves_no_statistics() {
    let h = harness();
    let mut payment = h.service.new_payment();
    payment.set_email("jane@example.com");
    h.service
        .add_line(&mut payment, ProductId::new(7), AddLineArgs::default())
        .await
        .unwrap();
    h.service.save(&mut payment).await.unwrap();

    assert_eq!(h.sales.sales_of(ProductId::new(7)), 0);
    assert_eq!(h.stats.total_earnings(), Money::zero());
    assert_eq!(
        h.customers.value_of(payment.customer_id().unwrap()),
        Money::zero()
    );
}

#[tokio::test]
async fn test_refund_reverses_a_published_payment() {
    let h = harness();
    let mut payment = h.service.new_payment();
    payment.set_email("jane@example.com");
    h.service
        .add_line(
            &mut payment,
            ProductId::new(7),
            AddLineArgs {
                quantity: 2,
                tax: Money::from_cents(400),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    payment.set_status(PaymentStatus::Published);
    h.service.save(&mut payment).await.unwrap();

    let id = payment.id().unwrap();
    let customer_id = payment.customer_id().unwrap();
    h.customers.record_purchase(customer_id);

    assert!(h.service.refund(&mut payment).await.unwrap());
    assert_eq!(payment.status(), &PaymentStatus::Refunded);
    assert_eq!(h.sales.sales_of(ProductId::new(7)), 0);
    assert_eq!(h.sales.earnings_of(ProductId::new(7)), Money::zero());
    assert!(h.sales.logs_for(id).is_empty());
    assert_eq!(h.stats.total_earnings(), Money::zero());
    assert_eq!(h.customers.value_of(customer_id), Money::zero());
    assert_eq!(h.customers.purchase_count_of(customer_id), 0);
    assert_eq!(h.stats.invalidation_count(), 1);

    let row = h.store.load(id).await.unwrap().unwrap();
    assert_eq!(row.status, "refunded");
}

#[tokio::test]
async fn test_repeated_refund_reconciles_once() {
    let h = harness();
    let mut payment = h.service.new_payment();
    payment.set_email("jane@example.com");
    h.service
        .add_line(&mut payment, ProductId::new(7), AddLineArgs::default())
        .await
        .unwrap();
    payment.set_status(PaymentStatus::Published);
    h.service.save(&mut payment).await.unwrap();
    h.service.refund(&mut payment).await.unwrap();
    let earnings_after_refund = h.stats.total_earnings();

    // Same-status transition is a no-op, so nothing reverses twice.
    assert!(!payment.set_status(PaymentStatus::Refunded));
    assert!(!h.service.save(&mut payment).await.unwrap());
    assert_eq!(h.stats.total_earnings(), earnings_after_refund);
    assert_eq!(h.stats.invalidation_count(), 1);
}

#[tokio::test]
async fn test_never_counted_chain_decrements_nothing() {
    let h = harness();
    h.discounts.set_usage("SAVE10", 5);

    let mut payment = h.service.new_payment();
    payment.set_email("jane@example.com");
    payment.set_discounts(DiscountCodes::Codes(vec!["SAVE10".to_string()]));
    h.service
        .add_line(&mut payment, ProductId::new(7), AddLineArgs::default())
        .await
        .unwrap();
    h.service.save(&mut payment).await.unwrap();
    let customer_id = payment.customer_id().unwrap();

    payment.set_status(PaymentStatus::Failed);
    h.service.save(&mut payment).await.unwrap();
    // The failure gives back the discount use.
    assert_eq!(h.discounts.usage_of("SAVE10"), 4);

    payment.set_status(PaymentStatus::Refunded);
    h.service.save(&mut payment).await.unwrap();

    // Never counted, so nothing to reverse anywhere.
    assert_eq!(h.sales.sales_of(ProductId::new(7)), 0);
    assert_eq!(h.stats.total_earnings(), Money::zero());
    assert_eq!(h.customers.value_of(customer_id), Money::zero());
    assert_eq!(h.stats.invalidation_count(), 0);
}

#[tokio::test]
async fn test_failed_payment_without_discounts_skips_registry() {
    let h = harness();
    let mut payment = h.service.new_payment();
    payment.set_email("jane@example.com");
    h.service.save(&mut payment).await.unwrap();

    h.discounts.set_fail_on_write(true);
    payment.set_status(PaymentStatus::Failed);
    // No codes attached, so the unavailable registry is never called.
    h.service.save(&mut payment).await.unwrap();
}

#[tokio::test]
async fn test_round_trip_without_changes_writes_nothing() {
    let h = harness();
    let mut payment = h.service.new_payment();
    payment.set_email("jane@example.com");
    payment.set_first_name("Jane");
    h.service
        .add_line(
            &mut payment,
            ProductId::new(7),
            AddLineArgs {
                tax: Money::from_cents(200),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    payment.add_fee(shipping_fee(500));
    h.service.save(&mut payment).await.unwrap();

    let id = payment.id().unwrap();
    let writes_before = h.store.write_count().await;
    let mut reloaded = h.service.load(id).await.unwrap();
    assert!(!h.service.save(&mut reloaded).await.unwrap());
    assert_eq!(h.store.write_count().await, writes_before);
}

#[tokio::test]
async fn test_hydration_preserves_aggregate_state() {
    let h = harness();
    let mut payment = h.service.new_payment();
    payment.set_email("jane@example.com");
    payment.set_first_name("Jane");
    payment.set_last_name("Doe");
    payment.set_gateway("stripe");
    payment.set_transaction_id("txn_123");
    payment.set_ip("203.0.113.9");
    h.service
        .add_line(
            &mut payment,
            ProductId::new(9),
            AddLineArgs {
                price_id: Some(PriceOptionId::new(1)),
                tax: Money::from_cents(500),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    payment.add_fee(shipping_fee(250));
    payment.set_status(PaymentStatus::Published);
    h.service.save(&mut payment).await.unwrap();

    let reloaded = h.service.load(payment.id().unwrap()).await.unwrap();
    assert_eq!(reloaded.email(), Some("jane@example.com"));
    assert_eq!(reloaded.first_name(), "Jane");
    assert_eq!(reloaded.last_name(), "Doe");
    assert_eq!(reloaded.gateway(), Some("stripe"));
    assert_eq!(reloaded.transaction_id(), Some("txn_123"));
    assert_eq!(reloaded.ip(), Some("203.0.113.9"));
    assert_eq!(reloaded.status(), &PaymentStatus::Published);
    assert_eq!(reloaded.display_status(), "Complete");
    assert_eq!(reloaded.key(), payment.key());
    assert_eq!(reloaded.subtotal(), Money::from_cents(5000));
    assert_eq!(reloaded.tax(), Money::from_cents(500));
    assert_eq!(reloaded.fees_total(), Money::from_cents(250));
    assert_eq!(reloaded.total(), Money::from_cents(5750));
    assert_eq!(reloaded.cart_details().len(), 1);
    assert_eq!(reloaded.cart_details()[0].price_id, Some(PriceOptionId::new(1)));
    assert!(reloaded.completed_at().is_some());
    assert!(reloaded.pending().is_empty());
}

#[tokio::test]
async fn test_removing_a_line_from_a_published_payment() {
    let h = harness();
    let mut payment = h.service.new_payment();
    payment.set_email("jane@example.com");
    h.service
        .add_line(
            &mut payment,
            ProductId::new(7),
            AddLineArgs {
                quantity: 2,
                tax: Money::from_cents(400),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    payment.set_status(PaymentStatus::Published);
    h.service.save(&mut payment).await.unwrap();

    payment
        .remove_line(ProductId::new(7), RemoveLineArgs::default())
        .unwrap();
    h.service.save(&mut payment).await.unwrap();

    // One unit backed out: unit price plus its share of the tax.
    assert_eq!(h.sales.sales_of(ProductId::new(7)), 1);
    assert_eq!(h.sales.earnings_of(ProductId::new(7)), Money::from_cents(2200));
    assert_eq!(h.stats.total_earnings(), Money::from_cents(2200));
    assert_eq!(payment.total(), Money::from_cents(2200));
}

#[tokio::test]
async fn test_purchasability_gate() {
    let h = harness();
    h.catalog.set_purchasable(ProductId::new(7), false);

    let mut payment = h.service.new_payment();
    let result = h
        .service
        .add_line(&mut payment, ProductId::new(7), AddLineArgs::default())
        .await;
    assert!(result.is_err());
    assert!(payment.cart_details().is_empty());
    assert!(payment.pending().cart_changes().is_empty());
}
