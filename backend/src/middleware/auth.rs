//! Authentication middleware
//!
//! Validates bearer tokens and attaches the caller's tenant to the request.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// Tenant information extracted from the JWT
#[derive(Clone, Debug)]
pub struct AuthTenant {
    pub user_id: Uuid,
    pub business_id: Uuid,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub business_id: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        Some(token) => token,
        None => return unauthorized("Missing or invalid Authorization header"),
    };

    let tenant = match decode_tenant(token, &state.config.jwt.secret) {
        Ok(tenant) => tenant,
        Err(err) => return err.into_response(),
    };

    tracing::debug!(
        user_id = %tenant.user_id,
        business_id = %tenant.business_id,
        "Authenticated request"
    );
    request.extensions_mut().insert(tenant);

    next.run(request).await
}

/// Decode a token and read the tenant out of its claims
pub fn decode_tenant(token: &str, secret: &str) -> Result<AuthTenant, AppError> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))?;
    let business_id = Uuid::parse_str(&claims.business_id)
        .map_err(|_| AppError::Unauthorized("Invalid business ID in token".to_string()))?;

    Ok(AuthTenant {
        user_id,
        business_id,
    })
}

fn unauthorized(message: &str) -> Response {
    AppError::Unauthorized(message.to_string()).into_response()
}

/// Extractor for the authenticated tenant
/// Use this in handlers to scope every query
#[derive(Clone, Debug)]
pub struct CurrentTenant(pub AuthTenant);

impl CurrentTenant {
    pub fn business_id(&self) -> Uuid {
        self.0.business_id
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthTenant>()
            .cloned()
            .map(CurrentTenant)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}
