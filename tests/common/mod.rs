#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use stockroom_api::{
    auth::Role,
    config::AppConfig,
    repositories::{InMemoryStore, SharedStore},
    services::reconciliation::ReferenceValidation,
    AppState,
};
use tower::ServiceExt;

/// Helper harness for driving the full router over an in-memory store.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    admin_token: String,
    viewer_token: String,
}

impl TestApp {
    /// Construct a new test application with empty storage.
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryStore::new()))
    }

    pub fn with_store(store: SharedStore) -> Self {
        Self::with_config(test_config(), store)
    }

    pub fn with_reference_validation(mode: ReferenceValidation) -> Self {
        let mut cfg = test_config();
        cfg.reference_validation = mode;
        Self::with_config(cfg, Arc::new(InMemoryStore::new()))
    }

    pub fn with_config(cfg: AppConfig, store: SharedStore) -> Self {
        let state = AppState::new(cfg, store);
        let admin_token = state
            .auth
            .issue_token("test-admin", Role::R2)
            .expect("issue admin token");
        let viewer_token = state
            .auth
            .issue_token("test-viewer", Role::R1)
            .expect("issue viewer token");

        Self {
            router: stockroom_api::app(state.clone()),
            state,
            admin_token,
            viewer_token,
        }
    }

    pub fn store(&self) -> SharedStore {
        self.state.store.clone()
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    pub fn viewer_token(&self) -> &str {
        &self.viewer_token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for requests as an administrator (R2).
    pub async fn as_admin(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request(method, uri, body, Some(self.admin_token())).await
    }

    /// Convenience helper for requests as a viewer (R1).
    pub async fn as_viewer(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request(method, uri, body, Some(self.viewer_token())).await
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        storage_backend: "in-memory".to_string(),
        environment: "test".to_string(),
        cors_allow_any_origin: true,
        ..AppConfig::default()
    }
}

/// Read a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is json")
}
