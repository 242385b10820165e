//! Roster API - REST Layer
//!
//! Axum handlers, bearer authentication and the Postgres store for the Roster
//! task-distribution backend. Admins manage agents and upload contact lists;
//! each upload is normalized and split across five active agents as tasks,
//! which agents then work through.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod macros;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use auth::{
    authenticate_jwt, generate_jwt_token, validate_jwt_token, AuthConfig, AuthContext, Claims,
};
pub use config::{ApiConfig, StoreBackend};
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use middleware::{auth_middleware, AdminPrincipal, AgentPrincipal, AuthMiddlewareState};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::{AppState, SharedStore};
pub use types::*;
