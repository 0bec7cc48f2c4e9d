use super::common::{created_response, json_body, success_response, validate_input};
use crate::{
    errors::ApiError,
    models::{expiry, DamageRecord},
    services::damage_records::{DamageAddOutcome, DamageChanges},
    services::reconciliation::{
        records::{validate_decimal_min_zero, validate_not_blank},
        DamageImportResponse, IncomingDamageRecord,
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
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDamageRecordRequest {
    #[validate(custom = "validate_not_blank")]
    #[schema(example = "C1")]
    pub company_id: String,
    #[validate(custom = "validate_not_blank")]
    #[schema(example = "P4")]
    pub product_id: String,
    #[validate(range(min = 0, max = 1000000000))]
    pub quantity: i64,
    #[serde(alias = "mrp")]
    #[validate(custom = "validate_decimal_min_zero")]
    #[schema(value_type = String, example = "12.50")]
    pub unit_price: Decimal,
    #[serde(alias = "dOExpiry", deserialize_with = "expiry::deserialize")]
    #[schema(value_type = String, example = "2025-06-30")]
    pub expiry: NaiveDate,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDamageRecordRequest {
    #[validate(range(min = 0, max = 1000000000))]
    pub quantity: Option<i64>,
    #[serde(default, alias = "mrp")]
    #[validate(custom = "validate_decimal_min_zero")]
    #[schema(value_type = Option<String>, example = "12.50")]
    pub unit_price: Option<Decimal>,
}

/// Reconcile a batch of damage write-offs
#[utoipa::path(
    post,
    path = "/api/v1/damage-records/import",
    request_body = Vec<IncomingDamageRecord>,
    responses(
        (status = 200, description = "Batch reconciled", body = DamageImportResponse),
        (status = 400, description = "Invalid batch or unknown reference", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse)
    ),
    tag = "damage-records"
)]
pub async fn import_damage_records(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DamageImportResponse>, ApiError> {
    let payload = json_body(payload)?;
    let outcome = state
        .services
        .reconciler
        .import_damage_records(payload)
        .await?;
    Ok(Json(outcome))
}

/// List damage records, released ones included
#[utoipa::path(
    get,
    path = "/api/v1/damage-records",
    responses(
        (status = 200, description = "Damage records in creation order", body = [DamageRecord])
    ),
    tag = "damage-records"
)]
pub async fn list_damage_records(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.services.damage_records.list().await?;
    Ok(success_response(records))
}

#[utoipa::path(
    get,
    path = "/api/v1/damage-records/{id}",
    params(("id" = Uuid, Path, description = "Damage record id")),
    responses(
        (status = 200, description = "Damage record returned", body = DamageRecord),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "damage-records"
)]
pub async fn get_damage_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.services.damage_records.get(id).await?;
    Ok(success_response(record))
}

/// Add a single damage record; an existing key is reported in-band
#[utoipa::path(
    post,
    path = "/api/v1/damage-records",
    request_body = CreateDamageRecordRequest,
    responses(
        (status = 201, description = "Damage record created", body = DamageAddOutcome),
        (status = 200, description = "Key already recorded", body = DamageAddOutcome),
        (status = 400, description = "Invalid request or unknown reference", body = crate::errors::ErrorResponse)
    ),
    tag = "damage-records"
)]
pub async fn create_damage_record(
    State(state): State<AppState>,
    payload: Result<Json<CreateDamageRecordRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    validate_input(&payload)?;

    let outcome = state
        .services
        .damage_records
        .add(
            payload.company_id,
            payload.product_id,
            payload.quantity,
            payload.unit_price,
            payload.expiry,
        )
        .await?;
    if outcome.is_duplicate {
        return Ok(success_response(outcome));
    }
    Ok(created_response(outcome))
}

#[utoipa::path(
    put,
    path = "/api/v1/damage-records/{id}",
    params(("id" = Uuid, Path, description = "Damage record id")),
    request_body = UpdateDamageRecordRequest,
    responses(
        (status = 200, description = "Damage record updated", body = DamageRecord),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Key collides with another record", body = crate::errors::ErrorResponse)
    ),
    tag = "damage-records"
)]
pub async fn update_damage_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateDamageRecordRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    validate_input(&payload)?;

    let changes = DamageChanges {
        quantity: payload.quantity,
        unit_price: payload.unit_price,
    };
    let record = state.services.damage_records.update(id, changes).await?;
    Ok(success_response(record))
}

/// Release a write-off; the record is kept with `deleted = true`
#[utoipa::path(
    delete,
    path = "/api/v1/damage-records/{id}",
    params(("id" = Uuid, Path, description = "Damage record id")),
    responses(
        (status = 200, description = "Damage record released", body = DamageRecord),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "damage-records"
)]
pub async fn release_damage_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.services.damage_records.release(id).await?;
    Ok(success_response(record))
}
