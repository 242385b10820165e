//! Agent REST API Routes
//!
//! Admin-only CRUD over the caller's own agents.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use roster_core::AgentId;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AdminPrincipal,
    services,
    state::{AppState, SharedStore},
    types::{
        AgentEnvelope, CreateAgentRequest, ListAgentsResponse, MessageResponse, UpdateAgentRequest,
    },
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/agents - Create a new agent
#[utoipa::path(
    post,
    path = "/api/agents",
    tag = "Agents",
    request_body = CreateAgentRequest,
    responses(
        (status = 201, description = "Agent created successfully", body = AgentEnvelope),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Caller is not an admin", body = ApiError),
        (status = 409, description = "Email or mobile already in use", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_agent(
    State(store): State<SharedStore>,
    AdminPrincipal(admin): AdminPrincipal,
    Json(req): Json<CreateAgentRequest>,
) -> ApiResult<impl IntoResponse> {
    let agent = services::create_agent(store.as_ref(), admin, req, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(AgentEnvelope::new("Agent created successfully", agent)),
    ))
}

/// GET /api/agents - List the caller's agents, newest first
#[utoipa::path(
    get,
    path = "/api/agents",
    tag = "Agents",
    responses(
        (status = 200, description = "List of agents", body = ListAgentsResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 403, description = "Caller is not an admin", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_agents(
    State(store): State<SharedStore>,
    AdminPrincipal(admin): AdminPrincipal,
) -> ApiResult<Json<ListAgentsResponse>> {
    let agents = services::list_agents(store.as_ref(), admin).await?;
    Ok(Json(ListAgentsResponse::new(agents)))
}

/// GET /api/agents/{id} - Get one agent
#[utoipa::path(
    get,
    path = "/api/agents/{id}",
    tag = "Agents",
    params(("id" = String, Path, description = "Agent ID")),
    responses(
        (status = 200, description = "Agent details", body = AgentEnvelope),
        (status = 400, description = "Malformed ID", body = ApiError),
        (status = 404, description = "Agent not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_agent(
    State(store): State<SharedStore>,
    AdminPrincipal(admin): AdminPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<AgentEnvelope>> {
    let id: AgentId = id.parse()?;
    let agent = services::get_agent(store.as_ref(), admin, id).await?;
    Ok(Json(AgentEnvelope::new("Agent retrieved successfully", agent)))
}

/// PUT /api/agents/{id} - Update an agent
#[utoipa::path(
    put,
    path = "/api/agents/{id}",
    tag = "Agents",
    params(("id" = String, Path, description = "Agent ID")),
    request_body = UpdateAgentRequest,
    responses(
        (status = 200, description = "Agent updated successfully", body = AgentEnvelope),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Agent not found", body = ApiError),
        (status = 409, description = "Email or mobile already in use", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_agent(
    State(store): State<SharedStore>,
    AdminPrincipal(admin): AdminPrincipal,
    Path(id): Path<String>,
    Json(req): Json<UpdateAgentRequest>,
) -> ApiResult<Json<AgentEnvelope>> {
    let id: AgentId = id.parse()?;
    let agent = services::update_agent(store.as_ref(), admin, id, req, Utc::now()).await?;
    Ok(Json(AgentEnvelope::new("Agent updated successfully", agent)))
}

/// DELETE /api/agents/{id} - Delete an agent
#[utoipa::path(
    delete,
    path = "/api/agents/{id}",
    tag = "Agents",
    params(("id" = String, Path, description = "Agent ID")),
    responses(
        (status = 200, description = "Agent deleted successfully", body = MessageResponse),
        (status = 404, description = "Agent not found", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_agent(
    State(store): State<SharedStore>,
    AdminPrincipal(admin): AdminPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id: AgentId = id.parse()?;
    services::delete_agent(store.as_ref(), admin, id).await?;
    Ok(Json(MessageResponse::new("Agent deleted successfully")))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the agent routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_agents).post(create_agent))
        .route("/:id", get(get_agent).put(update_agent).delete(delete_agent))
}
