//! Stockroom API Library
//!
//! Stock tracking backend: companies, their products with per-warehouse
//! detail lines, and damage write-offs, with bulk reconciliation of
//! imported batches against stored state.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Extension, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::ToSchema;

use crate::auth::{AuthConfig, AuthRouterExt, AuthService, Role};
use crate::repositories::SharedStore;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub store: SharedStore,
    pub services: handlers::AppServices,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(config: config::AppConfig, store: SharedStore) -> Self {
        let services = handlers::AppServices::new(store.clone(), &config);
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config)));
        Self {
            config,
            store,
            services,
            auth,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}


/// Versioned API routes with role gating
pub fn api_v1_routes() -> Router<AppState> {
    // Bulk imports are administrator-only
    let imports = Router::new()
        .route(
            "/companies/import",
            post(handlers::companies::import_companies),
        )
        .route("/products/import", post(handlers::products::import_products))
        .route(
            "/damage-records/import",
            post(handlers::damage_records::import_damage_records),
        )
        .with_roles(&[Role::R2]);

    // Listings open to viewers
    let catalog_read = Router::new()
        .route("/companies", get(handlers::companies::list_companies))
        .route("/products", get(handlers::products::list_products))
        .route(
            "/products/by-company/:company_id",
            get(handlers::products::list_products_by_company),
        )
        .with_roles(&[Role::R1, Role::R2]);

    let companies_admin = Router::new()
        .route("/companies", post(handlers::companies::create_company))
        .route(
            "/companies/:id",
            get(handlers::companies::get_company)
                .put(handlers::companies::update_company)
                .delete(handlers::companies::delete_company),
        )
        .with_roles(&[Role::R2]);

    let products_admin = Router::new()
        .route("/products", post(handlers::products::create_product))
        .route(
            "/products/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .with_roles(&[Role::R2]);

    let damage_records = Router::new()
        .route(
            "/damage-records",
            get(handlers::damage_records::list_damage_records)
                .post(handlers::damage_records::create_damage_record),
        )
        .route(
            "/damage-records/:id",
            get(handlers::damage_records::get_damage_record)
                .put(handlers::damage_records::update_damage_record)
                .delete(handlers::damage_records::release_damage_record),
        )
        .with_roles(&[Role::R2]);

    let dashboard = Router::new()
        .route(
            "/dashboard/company-count",
            get(handlers::dashboard::company_count),
        )
        .route(
            "/dashboard/damage-count",
            get(handlers::dashboard::damage_count),
        )
        .route(
            "/dashboard/top-companies",
            get(handlers::dashboard::top_companies),
        )
        .route(
            "/dashboard/company-ranking",
            get(handlers::dashboard::company_ranking),
        )
        .with_roles(&[Role::R2]);

    Router::new()
        .route("/status", get(api_status))
        .merge(imports)
        .merge(catalog_read)
        .merge(companies_admin)
        .merge(products_admin)
        .merge(damage_records)
        .merge(dashboard)
}

/// Builds the CORS layer from configured origins, falling back to a
/// permissive policy only where the configuration allows it.
pub fn cors_layer(config: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if config.should_allow_permissive_cors() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    }
}

/// Full application router: health, versioned API, Swagger UI and the
/// request-id, tracing, CORS and auth layers.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let auth = state.auth.clone();

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(cors)
        // Inject AuthService into request extensions for auth middleware
        .layer(Extension(auth))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}

async fn api_status(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let version = env!("CARGO_PKG_VERSION");
    let git = option_env!("GIT_HASH").unwrap_or("unknown");
    let build_time = option_env!("BUILD_TIME").unwrap_or("unknown");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "git": git,
        "build_time": build_time,
        "service": "stockroom-api",
        "storage_backend": state.config.storage_backend,
        "reference_validation": state.services.reconciler.reference_validation(),
        "timestamp": Utc::now().to_rfc3339(),
        "environment": state.config.environment,
    });

    Json(ApiResponse::success(status_data))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (status, storage) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(err) => {
            ::tracing::warn!(error = %err, "storage health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    let health_data = json!({
        "status": storage,
        "checks": { "storage": storage },
        "timestamp": Utc::now().to_rfc3339(),
    });

    (status, Json(ApiResponse::success(health_data)))
}
