use super::common::{created_response, json_body, message_response, success_response, validate_input};
use crate::{
    errors::ApiError,
    models::Company,
    services::companies::CompanyAddOutcome,
    services::reconciliation::{records::validate_not_blank, CompanyImportResponse},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyNameRequest {
    #[validate(custom = "validate_not_blank")]
    #[schema(example = "Acme Pharma")]
    pub company_name: String,
}

/// Reconcile a batch of companies
#[utoipa::path(
    post,
    path = "/api/v1/companies/import",
    request_body = Vec<crate::services::reconciliation::IncomingCompany>,
    responses(
        (status = 200, description = "Batch reconciled", body = CompanyImportResponse),
        (status = 400, description = "Invalid batch", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse)
    ),
    tag = "companies"
)]
pub async fn import_companies(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CompanyImportResponse>, ApiError> {
    let payload = json_body(payload)?;
    let outcome = state.services.reconciler.import_companies(payload).await?;
    Ok(Json(outcome))
}

/// List companies
#[utoipa::path(
    get,
    path = "/api/v1/companies",
    responses(
        (status = 200, description = "Companies in id order", body = [Company]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Storage failure", body = crate::errors::ErrorResponse)
    ),
    tag = "companies"
)]
pub async fn list_companies(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let companies = state.services.companies.list().await?;
    Ok(success_response(companies))
}

/// Get a company by id
#[utoipa::path(
    get,
    path = "/api/v1/companies/{id}",
    params(("id" = String, Path, description = "Company display id, e.g. C3")),
    responses(
        (status = 200, description = "Company returned", body = Company),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "companies"
)]
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let company = state.services.companies.get(&id).await?;
    Ok(success_response(company))
}

/// Add a single company; an existing name is reported in-band
#[utoipa::path(
    post,
    path = "/api/v1/companies",
    request_body = CompanyNameRequest,
    responses(
        (status = 201, description = "Company created", body = CompanyAddOutcome),
        (status = 200, description = "Name already exists", body = CompanyAddOutcome),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "companies"
)]
pub async fn create_company(
    State(state): State<AppState>,
    payload: Result<Json<CompanyNameRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    validate_input(&payload)?;

    let outcome = state.services.companies.add(payload.company_name).await?;
    if outcome.is_duplicate {
        return Ok(success_response(outcome));
    }
    Ok(created_response(outcome))
}

/// Rename a company
#[utoipa::path(
    put,
    path = "/api/v1/companies/{id}",
    params(("id" = String, Path, description = "Company display id")),
    request_body = CompanyNameRequest,
    responses(
        (status = 200, description = "Company renamed", body = Company),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name taken", body = crate::errors::ErrorResponse)
    ),
    tag = "companies"
)]
pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CompanyNameRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    validate_input(&payload)?;

    let company = state
        .services
        .companies
        .rename(&id, payload.company_name)
        .await?;
    Ok(success_response(company))
}

/// Delete a company and return the remaining ones
#[utoipa::path(
    delete,
    path = "/api/v1/companies/{id}",
    params(("id" = String, Path, description = "Company display id")),
    responses(
        (status = 200, description = "Company deleted", body = [Company]),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "companies"
)]
pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let remaining = state.services.companies.delete(&id).await?;
    info!(%id, remaining = remaining.len(), "company removed via api");
    Ok(message_response("company deleted", remaining))
}
