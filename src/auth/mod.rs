/*!
 * # Authentication and Authorization Module
 *
 * Bearer JWT (HS256) authentication with a two-role access model:
 *
 * - `R1` viewer: may list companies and products
 * - `R2` administrator: may do everything, including imports
 *
 * Route groups are guarded with [`AuthRouterExt::with_roles`]. The
 * [`AuthService`] must be present in request extensions, which the
 * application router arranges with an outer `Extension` layer.
 */

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::error_body;

/// Access role carried in the `roleId` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum Role {
    /// Viewer
    R1,
    /// Administrator
    R2,
}

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    #[serde(rename = "roleId")]
    pub role: Role,
    pub jti: String, // JWT ID
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated principal extracted from the bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub subject: String,
    pub role: Role,
    pub token_id: String,
}

impl AuthUser {
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::R2
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, token_expiration: Duration) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_expiration,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(config: &AppConfig) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            Duration::from_secs(config.jwt_expiration),
        )
    }
}

/// Issues and validates bearer tokens
#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Signs a token for `subject` with the given role.
    pub fn issue_token(&self, subject: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.token_expiration)
                .map_err(|_| AuthError::TokenCreation("invalid token duration".to_string()))?;

        let claims = Claims {
            sub: subject.to_string(),
            role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    fn authenticate(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
        let claims = self.validate_token(token)?;
        Ok(AuthUser {
            subject: claims.sub,
            role: claims.role,
            token_id: claims.jti,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Insufficient role")]
    InsufficientRole,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Authentication service not available")]
    ServiceUnavailable,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::InsufficientRole => StatusCode::FORBIDDEN,
            Self::TokenCreation(_) | Self::ServiceUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::MissingToken => "No authentication token provided".to_string(),
            Self::InvalidToken => "Invalid authentication token".to_string(),
            Self::TokenExpired => "Token has expired".to_string(),
            Self::InsufficientRole => "Role not allowed for this resource".to_string(),
            Self::TokenCreation(_) | Self::ServiceUnavailable => {
                "Internal server error".to_string()
            }
        };
        (status, Json(error_body(status, message))).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        let auth = parts
            .extensions
            .get::<Arc<AuthService>>()
            .ok_or(AuthError::ServiceUnavailable)?;
        auth.authenticate(&parts.headers)
    }
}

/// Authentication middleware that validates the bearer token and stores the
/// principal in request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Result<Response, AuthError> {
    let auth = request
        .extensions()
        .get::<Arc<AuthService>>()
        .cloned()
        .ok_or(AuthError::ServiceUnavailable)?;

    let user = auth.authenticate(request.headers()).map_err(|e| {
        debug!(error = %e, "authentication rejected");
        e
    })?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Role middleware to check the authenticated user against allowed roles
pub async fn role_middleware(
    State(allowed): State<Arc<[Role]>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingToken)?;

    if !user.has_any_role(&allowed) {
        warn!(subject = %user.subject, role = %user.role, "role not allowed");
        return Err(AuthError::InsufficientRole);
    }
    Ok(next.run(request).await)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_roles(self, roles: &[Role]) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_roles(self, roles: &[Role]) -> Self {
        let allowed: Arc<[Role]> = Arc::from(roles);
        self.layer(axum::middleware::from_fn_with_state(
            allowed,
            role_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::{body::Body, http::Request as HttpRequest, routing::get, Extension, Router};
    use std::str::FromStr;
    use tower::ServiceExt;

    const SECRET: &str = "test-secret-with-enough-length-to-look-like-a-real-signing-key-0123456789";

    fn service() -> AuthService {
        AuthService::new(AuthConfig::new(SECRET, Duration::from_secs(600)))
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let auth = service();
        let token = auth.issue_token("ops", Role::R2).unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "ops");
        assert_eq!(claims.role, Role::R2);
    }

    #[test]
    fn role_claim_is_named_role_id() {
        let claims = Claims {
            sub: "u".into(),
            role: Role::R1,
            jti: "j".into(),
            iat: 0,
            exp: 1,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["roleId"], "R1");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = AuthService::new(AuthConfig::new("another-secret", Duration::from_secs(600)));
        let token = other.issue_token("ops", Role::R2).unwrap();
        assert_matches!(service().validate_token(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let auth = service();
        let claims = Claims {
            sub: "ops".into(),
            role: Role::R2,
            jti: "j".into(),
            iat: 1_000,
            exp: 2_000,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_matches!(auth.validate_token(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn roles_parse_from_strings() {
        assert_eq!(Role::from_str("R1").unwrap(), Role::R1);
        assert!(Role::from_str("admin").is_err());
    }

    fn guarded_app(roles: &[Role]) -> Router {
        Router::new()
            .route("/guarded", get(|user: AuthUser| async move { user.subject }))
            .with_roles(roles)
            .layer(Extension(Arc::new(service())))
    }

    async fn status_for(app: Router, token: Option<String>) -> StatusCode {
        let mut builder = HttpRequest::builder().uri("/guarded");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn guard_maps_missing_wrong_and_allowed_roles() {
        let auth = service();
        assert_eq!(
            status_for(guarded_app(&[Role::R2]), None).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(guarded_app(&[Role::R2]), Some("garbage".into())).await,
            StatusCode::UNAUTHORIZED
        );
        let viewer = auth.issue_token("viewer", Role::R1).unwrap();
        assert_eq!(
            status_for(guarded_app(&[Role::R2]), Some(viewer.clone())).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(guarded_app(&[Role::R1, Role::R2]), Some(viewer)).await,
            StatusCode::OK
        );
    }
}
