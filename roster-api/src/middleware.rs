//! Axum Middleware for Authentication and Authorization
//!
//! - `auth_middleware` verifies the bearer token and injects [`AuthContext`]
//!   into request extensions, answering 401 when it cannot.
//! - `AuthExtractor` hands the context to handlers.
//! - `AdminPrincipal` / `AgentPrincipal` additionally enforce the role and
//!   answer 403 on mismatch.

use crate::auth::{authenticate_jwt, AuthConfig, AuthContext};
use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use roster_core::{AdminId, AgentId, Role};
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for authentication middleware.
#[derive(Debug, Clone)]
pub struct AuthMiddlewareState {
    pub auth_config: Arc<AuthConfig>,
}

impl AuthMiddlewareState {
    pub fn new(auth_config: AuthConfig) -> Self {
        Self {
            auth_config: Arc::new(auth_config),
        }
    }
}

// ============================================================================
// MIDDLEWARE FUNCTION
// ============================================================================

/// Authenticate `Authorization: Bearer <jwt>` and inject the [`AuthContext`].
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            AuthMiddlewareError(ApiError::unauthorized(
                "Authentication required: provide an Authorization header",
            ))
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AuthMiddlewareError(ApiError::unauthorized(
            "Authorization header must use Bearer scheme",
        ))
    })?;

    let auth_context = authenticate_jwt(&state.auth_config, token.trim()).map_err(|e| {
        tracing::debug!(code = %e.code, "Rejected bearer token");
        AuthMiddlewareError(e)
    })?;

    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error wrapper returned by the middleware and the extractors.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

// ============================================================================
// TYPED EXTRACTORS
// ============================================================================

/// The authenticated principal, whatever its role.
///
/// `auth_middleware` must run first; otherwise the extractor fails with 500.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .map(AuthExtractor)
            .ok_or_else(|| {
                AuthMiddlewareError(ApiError::internal_error(
                    "AuthContext not found in request extensions. \
                     Ensure auth_middleware is applied to this route.",
                ))
            })
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// An authenticated admin. Any other role is rejected with 403.
#[derive(Debug, Clone, Copy)]
pub struct AdminPrincipal(pub AdminId);

#[async_trait]
impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthExtractor(ctx) = AuthExtractor::from_request_parts(parts, state).await?;
        ctx.require_role(Role::Admin).map_err(AuthMiddlewareError)?;
        Ok(AdminPrincipal(ctx.admin_id()))
    }
}

/// An authenticated agent. Any other role is rejected with 403.
#[derive(Debug, Clone, Copy)]
pub struct AgentPrincipal(pub AgentId);

#[async_trait]
impl<S> FromRequestParts<S> for AgentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthExtractor(ctx) = AuthExtractor::from_request_parts(parts, state).await?;
        ctx.require_role(Role::Agent).map_err(AuthMiddlewareError)?;
        Ok(AgentPrincipal(ctx.agent_id()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
