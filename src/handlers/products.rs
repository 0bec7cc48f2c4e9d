use super::common::{created_response, json_body, message_response, success_response, validate_input};
use crate::{
    errors::ApiError,
    models::{expiry, DetailLine, Product},
    services::reconciliation::{
        records::{validate_decimal_min_zero, validate_not_blank, validate_percent},
        IncomingProductLine, ProductImportResponse,
    },
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    response::IntoResponse,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailLineRequest {
    #[serde(default, alias = "selectedWarehouse")]
    pub warehouse: String,
    #[serde(alias = "mrp")]
    #[validate(custom = "validate_decimal_min_zero")]
    #[schema(value_type = String, example = "12.50")]
    pub unit_price: Decimal,
    #[serde(default, alias = "defaultpercentage")]
    #[validate(custom = "validate_percent")]
    #[schema(value_type = String, example = "5")]
    pub discount_percent: Decimal,
    #[validate(range(min = 0, max = 1000000000))]
    pub quantity: i64,
    #[serde(alias = "dOExpiry", deserialize_with = "expiry::deserialize")]
    #[schema(value_type = String, example = "2025-06-30")]
    pub expiry: NaiveDate,
}

impl From<DetailLineRequest> for DetailLine {
    fn from(req: DetailLineRequest) -> Self {
        DetailLine {
            warehouse: req.warehouse,
            unit_price: req.unit_price,
            discount_percent: req.discount_percent,
            quantity: req.quantity,
            expiry: req.expiry,
        }
    }
}

/// Product create/replace payload. Any `totalQuantity` sent by the client is
/// ignored; totals are derived from `details`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[validate(custom = "validate_not_blank")]
    pub product_name: String,
    #[validate(custom = "validate_not_blank")]
    #[schema(example = "C1")]
    pub company_id: String,
    #[serde(default)]
    #[validate]
    pub details: Vec<DetailLineRequest>,
}

impl ProductRequest {
    fn into_parts(self) -> (String, String, Vec<DetailLine>) {
        let details = self.details.into_iter().map(DetailLine::from).collect();
        (self.product_name, self.company_id, details)
    }
}

/// Reconcile a batch of product detail lines
#[utoipa::path(
    post,
    path = "/api/v1/products/import",
    request_body = Vec<IncomingProductLine>,
    responses(
        (status = 200, description = "Batch reconciled", body = ProductImportResponse),
        (status = 400, description = "Invalid batch or unknown company", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn import_products(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProductImportResponse>, ApiError> {
    let payload = json_body(payload)?;
    let outcome = state.services.reconciler.import_products(payload).await?;
    Ok(Json(outcome))
}

/// List products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    responses(
        (status = 200, description = "Products in id order", body = [Product]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let products = state.services.products.list().await?;
    Ok(success_response(products))
}

/// List the products of one company
#[utoipa::path(
    get,
    path = "/api/v1/products/by-company/{company_id}",
    params(("company_id" = String, Path, description = "Company display id")),
    responses(
        (status = 200, description = "Products of the company", body = [Product])
    ),
    tag = "products"
)]
pub async fn list_products_by_company(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state.services.products.list_by_company(&company_id).await?;
    Ok(success_response(products))
}

/// Get a product by id
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = String, Path, description = "Product display id, e.g. P7")),
    responses(
        (status = 200, description = "Product returned", body = Product),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.products.get(&id).await?;
    Ok(success_response(product))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid request or unknown company", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already used by this company", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    validate_input(&payload)?;

    let (name, company_id, details) = payload.into_parts();
    let product = state
        .services
        .products
        .create(name, company_id, details)
        .await?;
    Ok(created_response(product))
}

/// Replace a product
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = String, Path, description = "Product display id")),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already used by this company", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    validate_input(&payload)?;

    let (name, company_id, details) = payload.into_parts();
    let product = state
        .services
        .products
        .update(&id, name, company_id, details)
        .await?;
    Ok(success_response(product))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = String, Path, description = "Product display id")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.products.delete(&id).await?;
    Ok(message_response("product deleted", id))
}
