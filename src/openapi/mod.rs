use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        version = "1.0.0",
        description = r#"
# Stockroom API

Stock tracking for supplier companies, their products and damaged-stock write-offs.

## Bulk imports

`POST /api/v1/{companies,products,damage-records}/import` accepts an ordered JSON
array. Each record is classified against stored state as new, mergeable or
duplicate. Duplicates are reported in the response, never as errors.

## Authentication

Every endpoint except status and health requires a bearer JWT carrying a
`roleId` claim of `R1` (viewer) or `R2` (administrator):

```
Authorization: Bearer <your-jwt-token>
```

## Error Handling

```json
{
  "error": "Bad Request",
  "message": "Reference not found: company 'Acme' does not exist",
  "request_id": "5b0c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    modifiers(&SecurityAddon),
    security(("bearer_auth" = [])),
    tags(
        (name = "companies", description = "Supplier companies"),
        (name = "products", description = "Products and their detail lines"),
        (name = "damage-records", description = "Damaged-stock write-offs"),
        (name = "dashboard", description = "Company roll-ups and counters")
    ),
    paths(
        // Companies
        crate::handlers::companies::import_companies,
        crate::handlers::companies::list_companies,
        crate::handlers::companies::get_company,
        crate::handlers::companies::create_company,
        crate::handlers::companies::update_company,
        crate::handlers::companies::delete_company,

        // Products
        crate::handlers::products::import_products,
        crate::handlers::products::list_products,
        crate::handlers::products::list_products_by_company,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        // Damage records
        crate::handlers::damage_records::import_damage_records,
        crate::handlers::damage_records::list_damage_records,
        crate::handlers::damage_records::get_damage_record,
        crate::handlers::damage_records::create_damage_record,
        crate::handlers::damage_records::update_damage_record,
        crate::handlers::damage_records::release_damage_record,

        // Dashboard
        crate::handlers::dashboard::company_count,
        crate::handlers::dashboard::damage_count,
        crate::handlers::dashboard::top_companies,
        crate::handlers::dashboard::company_ranking,
    ),
    components(
        schemas(
            crate::models::Company,
            crate::models::Product,
            crate::models::DetailLine,
            crate::models::DamageRecord,
            crate::services::reconciliation::IncomingCompany,
            crate::services::reconciliation::IncomingProductLine,
            crate::services::reconciliation::IncomingDamageRecord,
            crate::services::reconciliation::ImportMessage,
            crate::services::reconciliation::CompanyImportResponse,
            crate::services::reconciliation::ProductImportResponse,
            crate::services::reconciliation::DamageImportResponse,
            crate::services::companies::CompanyAddOutcome,
            crate::services::damage_records::DamageAddOutcome,
            crate::services::reports::CompanyQuantity,
            crate::services::reports::QuantitySource,
            crate::handlers::companies::CompanyNameRequest,
            crate::handlers::products::ProductRequest,
            crate::handlers::products::DetailLineRequest,
            crate::handlers::damage_records::CreateDamageRecordRequest,
            crate::handlers::damage_records::UpdateDamageRecordRequest,
            crate::handlers::dashboard::CompanyCount,
            crate::handlers::dashboard::DamageCount,
            crate::ResponseMeta,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
