use crate::{
    errors::ApiError,
    services::reports::{CompanyQuantity, ReportQuery},
    AppState,
};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCount {
    pub company_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DamageCount {
    pub damage_count: usize,
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/company-count",
    responses((status = 200, description = "Number of companies", body = CompanyCount)),
    tag = "dashboard"
)]
pub async fn company_count(State(state): State<AppState>) -> Result<Json<CompanyCount>, ApiError> {
    let company_count = state.services.reports.company_count().await?;
    Ok(Json(CompanyCount { company_count }))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/damage-count",
    responses((status = 200, description = "Number of unreleased damage records", body = DamageCount)),
    tag = "dashboard"
)]
pub async fn damage_count(State(state): State<AppState>) -> Result<Json<DamageCount>, ApiError> {
    let damage_count = state.services.reports.active_damage_count().await?;
    Ok(Json(DamageCount { damage_count }))
}

/// Up to five companies ordered by name, highest quantity first among equal names
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/top-companies",
    params(ReportQuery),
    responses((status = 200, description = "Top companies by name", body = [CompanyQuantity])),
    tag = "dashboard"
)]
pub async fn top_companies(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<CompanyQuantity>>, ApiError> {
    let rows = state.services.reports.top_companies(query.source).await?;
    Ok(Json(rows))
}

/// Every company ordered by summed quantity, highest first
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/company-ranking",
    params(ReportQuery),
    responses((status = 200, description = "Companies ranked by quantity", body = [CompanyQuantity])),
    tag = "dashboard"
)]
pub async fn company_ranking(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<CompanyQuantity>>, ApiError> {
    let rows = state.services.reports.company_ranking(query.source).await?;
    Ok(Json(rows))
}
