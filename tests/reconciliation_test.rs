//! Batch reconciliation against the in-memory store.

use std::sync::Arc;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use stockroom_api::{
    errors::ServiceError,
    models::Company,
    repositories::{InMemoryStore, SharedStore, Store},
    services::{
        reconciliation::{BatchReconciler, ImportMessage, ReferenceValidation},
        reports::{CompanyQuantity, QuantitySource, ReportService},
    },
};

fn reconciler(store: &SharedStore, mode: ReferenceValidation) -> BatchReconciler {
    BatchReconciler::new(store.clone(), mode, 5000)
}

fn line(company: &str, product: &str, warehouse: &str, quantity: i64) -> Value {
    json!({
        "companyName": company,
        "productName": product,
        "unitPrice": "12.50",
        "discountPercent": "5",
        "quantity": quantity,
        "expiry": "2025-06-30",
        "warehouse": warehouse,
    })
}

async fn store_with_companies(names: &[&str]) -> SharedStore {
    let store: SharedStore = Arc::new(InMemoryStore::new());
    if names.is_empty() {
        return store;
    }
    let batch: Vec<Value> = names.iter().map(|n| json!({ "companyName": n })).collect();
    reconciler(&store, ReferenceValidation::Upfront)
        .import_companies(Value::Array(batch))
        .await
        .expect("seed companies");
    store
}

#[tokio::test]
async fn totals_match_details_after_creation_and_merge() {
    let store = store_with_companies(&["Acme"]).await;
    let engine = reconciler(&store, ReferenceValidation::Upfront);

    engine
        .import_products(json!([line("Acme", "Aspirin", "North", 10)]))
        .await
        .unwrap();
    let outcome = engine
        .import_products(json!([line("Acme", "Aspirin", "South", 15)]))
        .await
        .unwrap();

    assert_eq!(outcome.updated_products.len(), 1);
    for product in store.products().await.unwrap() {
        assert!(product.is_consistent());
        assert_eq!(product.total_quantity, 25);
        assert_eq!(product.details.len(), 2);
    }
}

#[tokio::test]
async fn same_line_twice_is_a_duplicate_and_leaves_total_unchanged() {
    let store = store_with_companies(&["Acme"]).await;
    let engine = reconciler(&store, ReferenceValidation::Upfront);
    let batch = json!([line("Acme", "Aspirin", "North", 10)]);

    let first = engine.import_products(batch.clone()).await.unwrap();
    assert_eq!(first.message, ImportMessage::Created);

    let second = engine.import_products(batch).await.unwrap();
    assert_eq!(second.message, ImportMessage::Duplicate);
    assert!(second.new_products.is_empty());
    assert!(second.updated_products.is_empty());
    assert_eq!(second.duplicates.len(), 1);
    assert_eq!(second.duplicates[0].product_name, "Aspirin");

    let products = store.products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].total_quantity, 10);
}

#[tokio::test]
async fn new_product_with_two_lines_in_one_batch_is_created_once() {
    let store = store_with_companies(&["Acme"]).await;
    let outcome = reconciler(&store, ReferenceValidation::Upfront)
        .import_products(json!([
            line("Acme", "Aspirin", "A", 10),
            line("Acme", "Aspirin", "B", 15),
        ]))
        .await
        .unwrap();

    assert_eq!(outcome.new_products.len(), 1);
    assert!(outcome.updated_products.is_empty());
    let product = &outcome.new_products[0];
    assert_eq!(product.id, "P1");
    assert_eq!(product.details.len(), 2);
    assert_eq!(product.total_quantity, 25);

    let stored = store.products().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], *product);
}

#[tokio::test]
async fn company_ids_continue_numerically_past_c9() {
    let store: SharedStore = Arc::new(InMemoryStore::new());
    store
        .insert_companies(&[Company::new("C9", "Existing"), Company::new("C2", "Other")])
        .await
        .unwrap();

    let outcome = reconciler(&store, ReferenceValidation::Upfront)
        .import_companies(json!([{ "companyName": "Newcomer" }]))
        .await
        .unwrap();
    assert_eq!(outcome.new_companies[0].id, "C10");
}

#[tokio::test]
async fn top_five_by_name_sums_products_per_company() {
    let store = store_with_companies(&["Acme", "Beta"]).await;
    reconciler(&store, ReferenceValidation::Upfront)
        .import_products(json!([
            line("Acme", "Aspirin", "A", 30),
            line("Beta", "Bandage", "A", 50),
            line("Acme", "Antacid", "A", 20),
        ]))
        .await
        .unwrap();

    let rows = ReportService::new(store)
        .top_companies(QuantitySource::Stock)
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![
            CompanyQuantity {
                company_name: "Acme".into(),
                total_quantity: 50
            },
            CompanyQuantity {
                company_name: "Beta".into(),
                total_quantity: 50
            },
        ]
    );
}

#[tokio::test]
async fn ranking_orders_by_quantity_when_distinct() {
    let store = store_with_companies(&["Acme", "Beta", "Gamma"]).await;
    reconciler(&store, ReferenceValidation::Upfront)
        .import_products(json!([
            line("Acme", "Aspirin", "A", 5),
            line("Beta", "Bandage", "A", 50),
            line("Gamma", "Gauze", "A", 20),
        ]))
        .await
        .unwrap();

    let rows = ReportService::new(store)
        .company_ranking(QuantitySource::Stock)
        .await
        .unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.company_name.as_str()).collect();
    assert_eq!(names, vec!["Beta", "Gamma", "Acme"]);
}

async fn store_with_one_product() -> SharedStore {
    let store = store_with_companies(&["Acme"]).await;
    reconciler(&store, ReferenceValidation::Upfront)
        .import_products(json!([line("Acme", "Aspirin", "A", 10)]))
        .await
        .unwrap();
    store
}

fn damage(company: &str, price: &str) -> Value {
    json!({
        "companyName": company,
        "productName": "Aspirin",
        "quantity": 2,
        "unitPrice": price,
        "expiry": "2025-06-30",
    })
}

#[tokio::test]
async fn upfront_mode_rejects_unknown_company_without_writes() {
    let store = store_with_one_product().await;
    let result = reconciler(&store, ReferenceValidation::Upfront)
        .import_damage_records(json!([damage("Acme", "1.00"), damage("Ghost", "2.00")]))
        .await;

    assert_matches!(result, Err(ServiceError::ReferenceNotFound(_)));
    assert!(store.damage_records().await.unwrap().is_empty());
}

#[tokio::test]
async fn interleaved_mode_keeps_records_before_unknown_company() {
    let store = store_with_one_product().await;
    let result = reconciler(&store, ReferenceValidation::Interleaved)
        .import_damage_records(json!([damage("Acme", "1.00"), damage("Ghost", "2.00")]))
        .await;

    assert_matches!(result, Err(ServiceError::ReferenceNotFound(_)));
    let stored = store.damage_records().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].unit_price, dec!(1.00));
}

#[tokio::test]
async fn damage_duplicates_compare_prices_numerically() {
    let store = store_with_one_product().await;
    let engine = reconciler(&store, ReferenceValidation::Upfront);

    engine
        .import_damage_records(json!([damage("Acme", "4.50")]))
        .await
        .unwrap();
    let outcome = engine
        .import_damage_records(json!([damage("Acme", "4.5")]))
        .await
        .unwrap();

    assert_eq!(outcome.message, ImportMessage::Duplicate);
    assert_eq!(outcome.duplicates[0].company_id, "C1");
    assert_eq!(outcome.duplicates[0].product_id, "P1");
}

#[tokio::test]
async fn batches_over_the_limit_are_rejected() {
    let store = store_with_companies(&[]).await;
    let engine = BatchReconciler::new(store.clone(), ReferenceValidation::Upfront, 2);
    let result = engine
        .import_companies(json!([
            { "companyName": "A" },
            { "companyName": "B" },
            { "companyName": "C" }
        ]))
        .await;

    assert_matches!(result, Err(ServiceError::ValidationError(_)));
    assert!(store.companies().await.unwrap().is_empty());
}

#[tokio::test]
async fn upfront_product_batch_with_unknown_company_writes_nothing() {
    let store = store_with_one_product().await;
    let result = reconciler(&store, ReferenceValidation::Upfront)
        .import_products(json!([
            line("Acme", "Aspirin", "B", 5),
            line("Acme", "Gauze", "A", 7),
            line("Ghost", "Aspirin", "A", 1)
        ]))
        .await;

    assert_matches!(result, Err(ServiceError::ReferenceNotFound(msg)) if msg.contains("Ghost"));
    let products = store.products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].total_quantity, 10);
    assert_eq!(store.id_high_water("P").await.unwrap(), Some(1));
}

#[tokio::test]
async fn interleaved_product_batch_persists_lines_before_unknown_company() {
    let store = store_with_one_product().await;
    let result = reconciler(&store, ReferenceValidation::Interleaved)
        .import_products(json!([
            line("Acme", "Aspirin", "B", 5),
            line("Acme", "Gauze", "A", 7),
            line("Ghost", "Aspirin", "A", 1),
            line("Acme", "Iodine", "A", 2)
        ]))
        .await;

    assert_matches!(result, Err(ServiceError::ReferenceNotFound(_)));
    let products = store.products().await.unwrap();
    let summary: Vec<(&str, &str, i64)> = products
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str(), p.total_quantity))
        .collect();
    assert_eq!(summary, vec![("P1", "Aspirin", 15), ("P2", "Gauze", 7)]);
    assert_eq!(store.id_high_water("P").await.unwrap(), Some(2));
}

#[tokio::test]
async fn product_line_repeated_within_a_batch_is_a_duplicate() {
    let store = store_with_companies(&["Acme"]).await;
    let outcome = reconciler(&store, ReferenceValidation::Upfront)
        .import_products(json!([
            line("Acme", "Aspirin", "W", 1),
            line("Acme", "Aspirin", "W", 1),
            line("Acme", "Aspirin", "X", 2)
        ]))
        .await
        .unwrap();

    assert_eq!(outcome.new_products.len(), 1);
    assert!(outcome.updated_products.is_empty());
    assert_eq!(outcome.duplicates.len(), 1);
    assert_eq!(outcome.duplicates[0].product_name, "Aspirin");

    let stored = store.products().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].details.len(), 2);
    assert_eq!(stored[0].total_quantity, 3);
}

#[tokio::test]
async fn damage_record_repeated_within_a_batch_is_a_duplicate() {
    let store = store_with_one_product().await;
    let outcome = reconciler(&store, ReferenceValidation::Upfront)
        .import_damage_records(json!([
            damage("Acme", "3.00"),
            damage("Acme", "3.0"),
            damage("Acme", "4.00")
        ]))
        .await
        .unwrap();

    assert_eq!(outcome.message, ImportMessage::Created);
    assert_eq!(outcome.new_damage_records.len(), 2);
    assert_eq!(outcome.duplicates.len(), 1);
    assert_eq!(store.damage_records().await.unwrap().len(), 2);
}

#[tokio::test]
async fn reimport_after_deleting_top_product_allocates_a_fresh_id() {
    let store = store_with_one_product().await;
    assert!(store.delete_product("P1").await.unwrap());

    let outcome = reconciler(&store, ReferenceValidation::Upfront)
        .import_products(json!([line("Acme", "Aspirin", "A", 10)]))
        .await
        .unwrap();
    assert_eq!(outcome.new_products[0].id, "P2");
}
