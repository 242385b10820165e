//! REST API Routes
//!
//! Route modules per resource plus the top-level router assembly.

pub mod agent;
pub mod health;
pub mod list;
pub mod task;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth::AuthConfig,
    config::ApiConfig,
    error::ApiResult,
    middleware::{auth_middleware, AuthMiddlewareState},
    openapi::ApiDoc,
    state::AppState,
    telemetry::{metrics_handler, observability_middleware},
};
use utoipa::OpenApi;

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}

/// Create the complete API router.
///
/// - /api/agents, /api/lists, /api/tasks behind bearer authentication
/// - /api/health and /health/* (public)
/// - /metrics and /openapi.json (public)
///
/// Fails when `auth_config` is not fit for a production environment.
pub fn create_api_router(state: AppState, auth_config: AuthConfig) -> ApiResult<Router> {
    auth_config.validate_for_production()?;

    let auth_state = AuthMiddlewareState::new(auth_config);

    // Routes added after the auth layer stay public.
    let api_routes = Router::new()
        .nest("/agents", agent::create_router())
        .nest("/lists", list::create_router(&state.config))
        .nest("/tasks", task::create_router())
        .layer(from_fn_with_state(auth_state, auth_middleware))
        .route("/health", get(health::readiness));

    let cors = build_cors_layer(&state.config);

    let router = Router::new()
        .nest("/api", api_routes)
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json))
        .layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(router)
}
