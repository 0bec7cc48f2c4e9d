mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::json;
use stockroom_api::{
    models::{Company, DamageRecord, Product},
    repositories::{InMemoryStore, Store, StoreError},
    services::reconciliation::ReferenceValidation,
};
use uuid::Uuid;

async fn seed_catalog(app: &TestApp) {
    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/companies/import",
            Some(json!([{ "companyName": "Acme" }, { "companyName": "Beta" }])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/products/import",
            Some(json!([{
                "companyName": "Acme",
                "productName": "Aspirin",
                "unitPrice": "12.50",
                "discountPercent": 5,
                "quantity": 40,
                "expiry": "2025-06-30T10:15:00Z",
                "warehouse": "North"
            }])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn company_import_reports_created_then_duplicate() {
    let app = TestApp::new();
    let batch = json!([{ "companyName": "Acme" }, { "companyName": "Beta" }]);

    let response = app
        .as_admin(Method::POST, "/api/v1/companies/import", Some(batch.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["message"], "created");
    assert_eq!(body["newCompanies"][0]["id"], "C1");
    assert_eq!(body["newCompanies"][1]["id"], "C2");

    let response = app
        .as_admin(Method::POST, "/api/v1/companies/import", Some(batch))
        .await;
    let body = response_json(response).await;
    assert_eq!(body["message"], "duplicate");
    assert_eq!(body["duplicates"][1]["companyName"], "Beta");
    assert_eq!(body["duplicates"][1]["isDuplicate"], true);
}

#[tokio::test]
async fn product_import_with_legacy_field_names_merges_by_day() {
    let app = TestApp::new();
    seed_catalog(&app).await;

    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/products/import",
            Some(json!([{
                "companyName": "Acme",
                "productName": "Aspirin",
                "mrp": 12.5,
                "defaultpercentage": "5",
                "quantity": 40,
                "dOExpiry": "2025-06-30T22:00:00Z",
                "selectedWarehouse": "North"
            }])),
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["message"], "duplicate");
    assert_eq!(body["duplicates"][0]["productName"], "Aspirin");

    let products = app.store().products().await.unwrap();
    assert_eq!(products[0].total_quantity, 40);
}

#[tokio::test]
async fn product_import_with_unknown_company_is_bad_request() {
    let app = TestApp::new();
    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/products/import",
            Some(json!([{
                "companyName": "Ghost",
                "productName": "Aspirin",
                "unitPrice": "1",
                "discountPercent": "0",
                "quantity": 1,
                "expiry": "2025-01-01",
                "warehouse": "A"
            }])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Bad Request");
    assert!(body["message"].as_str().unwrap().contains("Ghost"));
}

#[tokio::test]
async fn non_array_payload_is_a_validation_error() {
    let app = TestApp::new();
    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/companies/import",
            Some(json!({ "companyName": "Acme" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.store().companies().await.unwrap().is_empty());
}

#[tokio::test]
async fn imports_require_an_administrator() {
    let app = TestApp::new();
    let batch = Some(json!([{ "companyName": "Acme" }]));

    let response = app
        .request(Method::POST, "/api/v1/companies/import", batch.clone(), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .as_viewer(Method::POST, "/api/v1/companies/import", batch)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn viewers_can_list_catalog() {
    let app = TestApp::new();
    seed_catalog(&app).await;

    let response = app.as_viewer(Method::GET, "/api/v1/companies", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let response = app
        .as_viewer(Method::GET, "/api/v1/products/by-company/C1", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"][0]["name"], "Aspirin");
    assert_eq!(body["data"][0]["totalQuantity"], 40);

    let response = app.as_viewer(Method::GET, "/api/v1/products/P1", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn single_company_add_reports_duplicates_in_band() {
    let app = TestApp::new();
    let payload = Some(json!({ "companyName": "Acme" }));

    let response = app
        .as_admin(Method::POST, "/api/v1/companies", payload.clone())
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.as_admin(Method::POST, "/api/v1/companies", payload).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["isDuplicate"], true);
    assert_eq!(body["data"]["message"], "duplicate");
}

#[tokio::test]
async fn renaming_to_a_taken_name_conflicts() {
    let app = TestApp::new();
    seed_catalog(&app).await;

    let response = app
        .as_admin(
            Method::PUT,
            "/api/v1/companies/C2",
            Some(json!({ "companyName": "Acme" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .as_admin(Method::GET, "/api/v1/companies/C99", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_create_ignores_client_total() {
    let app = TestApp::new();
    seed_catalog(&app).await;

    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "productName": "Bandage",
                "companyId": "C2",
                "totalQuantity": 1000,
                "details": [
                    { "warehouse": "A", "unitPrice": "2", "discountPercent": "0", "quantity": 3, "expiry": "2026-01-01" },
                    { "warehouse": "B", "unitPrice": "2", "discountPercent": "0", "quantity": 4, "expiry": "2026-01-01" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["id"], "P2");
    assert_eq!(body["data"]["totalQuantity"], 7);

    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "productName": "Bandage", "companyId": "C2", "details": [] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn deleted_company_id_is_not_handed_to_the_next_company() {
    let app = TestApp::new();
    seed_catalog(&app).await;

    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/products/import",
            Some(json!([{
                "companyName": "Beta",
                "productName": "Bandage",
                "unitPrice": "2",
                "discountPercent": "0",
                "quantity": 50,
                "expiry": "2026-01-01",
                "warehouse": "A"
            }])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .as_admin(Method::DELETE, "/api/v1/companies/C2", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/companies",
            Some(json!({ "companyName": "Gamma" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response_json(response).await["data"]["company"]["id"], "C3");

    let response = app
        .as_admin(Method::GET, "/api/v1/dashboard/company-ranking", None)
        .await;
    let ranking = response_json(response).await;
    let names: Vec<_> = ranking
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["companyName"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Acme"]);

    let response = app
        .as_admin(Method::GET, "/api/v1/products/by-company/C3", None)
        .await;
    let body = response_json(response).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn damage_lifecycle_and_dashboard_counts() {
    let app = TestApp::new();
    seed_catalog(&app).await;

    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/damage-records/import",
            Some(json!([
                { "companyName": "Acme", "productName": "Aspirin", "quantity": 3, "unitPrice": "12.50", "expiry": "2025-06-30" },
                { "companyName": "Acme", "productName": "Aspirin", "quantity": 9, "unitPrice": "12.5", "expiry": "2025-06-30" }
            ])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["newDamageRecords"].as_array().unwrap().len(), 1);
    assert_eq!(body["duplicates"][0]["productId"], "P1");
    let id = body["newDamageRecords"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .as_admin(Method::GET, "/api/v1/dashboard/damage-count", None)
        .await;
    assert_eq!(response_json(response).await["damageCount"], 1);

    let response = app
        .as_admin(
            Method::GET,
            "/api/v1/dashboard/top-companies?source=damage",
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body[0]["companyName"], "Acme");
    assert_eq!(body[0]["totalQuantity"], 3);

    let response = app
        .as_admin(Method::DELETE, &format!("/api/v1/damage-records/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["data"]["deleted"], true);

    let response = app
        .as_admin(Method::GET, "/api/v1/dashboard/damage-count", None)
        .await;
    assert_eq!(response_json(response).await["damageCount"], 0);

    let response = app
        .as_admin(Method::GET, "/api/v1/dashboard/company-count", None)
        .await;
    assert_eq!(response_json(response).await["companyCount"], 2);
}

#[tokio::test]
async fn interleaved_mode_is_selectable_through_config() {
    let app = TestApp::with_reference_validation(ReferenceValidation::Interleaved);
    seed_catalog(&app).await;

    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/damage-records/import",
            Some(json!([
                { "companyName": "Acme", "productName": "Aspirin", "quantity": 3, "unitPrice": "1", "expiry": "2025-06-30" },
                { "companyName": "Nobody", "productName": "Aspirin", "quantity": 3, "unitPrice": "1", "expiry": "2025-06-30" }
            ])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.store().damage_records().await.unwrap().len(), 1);
}

#[tokio::test]
async fn request_id_is_echoed_into_error_bodies() {
    let app = TestApp::new();
    let response = app
        .as_admin(Method::GET, "/api/v1/companies/C42", None)
        .await;
    let header = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("request id header");
    let body = response_json(response).await;
    assert_eq!(body["request_id"], header);
}

#[tokio::test]
async fn health_and_status_are_public() {
    let app = TestApp::new();
    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["data"]["status"], "healthy");

    let response = app.request(Method::GET, "/api/v1/status", None, None).await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["service"], "stockroom-api");
    assert_eq!(body["data"]["reference_validation"], "upfront");
}

/// Store whose writes always fail, reads delegate to memory.
struct FailingWrites {
    inner: InMemoryStore,
}

fn boom() -> StoreError {
    StoreError::Backend("disk full".into())
}

#[async_trait]
impl Store for FailingWrites {
    async fn companies(&self) -> Result<Vec<Company>, StoreError> {
        self.inner.companies().await
    }
    async fn company(&self, id: &str) -> Result<Option<Company>, StoreError> {
        self.inner.company(id).await
    }
    async fn insert_companies(&self, _companies: &[Company]) -> Result<(), StoreError> {
        Err(boom())
    }
    async fn update_company(&self, _company: &Company) -> Result<(), StoreError> {
        Err(boom())
    }
    async fn delete_company(&self, _id: &str) -> Result<bool, StoreError> {
        Err(boom())
    }
    async fn products(&self) -> Result<Vec<Product>, StoreError> {
        self.inner.products().await
    }
    async fn product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        self.inner.product(id).await
    }
    async fn insert_products(&self, _products: &[Product]) -> Result<(), StoreError> {
        Err(boom())
    }
    async fn update_product(&self, _product: &Product) -> Result<(), StoreError> {
        Err(boom())
    }
    async fn delete_product(&self, _id: &str) -> Result<bool, StoreError> {
        Err(boom())
    }
    async fn damage_records(&self) -> Result<Vec<DamageRecord>, StoreError> {
        self.inner.damage_records().await
    }
    async fn damage_record(&self, id: Uuid) -> Result<Option<DamageRecord>, StoreError> {
        self.inner.damage_record(id).await
    }
    async fn insert_damage_records(&self, _records: &[DamageRecord]) -> Result<(), StoreError> {
        Err(boom())
    }
    async fn update_damage_record(&self, _record: &DamageRecord) -> Result<(), StoreError> {
        Err(boom())
    }
    async fn id_high_water(&self, prefix: &str) -> Result<Option<u64>, StoreError> {
        self.inner.id_high_water(prefix).await
    }
    async fn raise_id_high_water(&self, _prefix: &str, _value: u64) -> Result<(), StoreError> {
        Err(boom())
    }
    async fn ping(&self) -> Result<(), StoreError> {
        Err(boom())
    }
}

#[tokio::test]
async fn storage_failures_surface_as_500_with_message() {
    let app = TestApp::with_store(Arc::new(FailingWrites {
        inner: InMemoryStore::new(),
    }));

    let response = app
        .as_admin(
            Method::POST,
            "/api/v1/companies/import",
            Some(json!([{ "companyName": "Acme" }])),
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("disk full"));

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
