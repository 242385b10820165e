//! Task REST API Routes
//!
//! Agent-only views over the caller's own tasks.

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;
use roster_core::{Pagination, TaskId};

use crate::{
    error::{ApiError, ApiResult},
    middleware::AgentPrincipal,
    services,
    state::{AppState, SharedStore},
    types::{
        ListTasksQuery, ListTasksResponse, TaskEnvelope, TaskStatsResponse, UpdateTaskStatusRequest,
    },
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/tasks - The caller's tasks, newest first
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "Tasks",
    params(ListTasksQuery),
    responses(
        (status = 200, description = "A page of tasks", body = ListTasksResponse),
        (status = 400, description = "Invalid status filter", body = ApiError),
        (status = 403, description = "Caller is not an agent", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_tasks(
    State(store): State<SharedStore>,
    AgentPrincipal(agent): AgentPrincipal,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<ListTasksResponse>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(services::parse_status)
        .transpose()?;
    let pagination = Pagination::from_query(query.page, query.limit);

    let (tasks, pagination) =
        services::list_my_tasks(store.as_ref(), agent, status, pagination).await?;
    Ok(Json(ListTasksResponse {
        message: "Tasks retrieved successfully".to_string(),
        tasks,
        pagination,
    }))
}

/// PUT /api/tasks/{id}/status - Move a task to a new status
#[utoipa::path(
    put,
    path = "/api/tasks/{id}/status",
    tag = "Tasks",
    params(("id" = String, Path, description = "Task ID")),
    request_body = UpdateTaskStatusRequest,
    responses(
        (status = 200, description = "Task status updated", body = TaskEnvelope),
        (status = 400, description = "Invalid status", body = ApiError),
        (status = 404, description = "Task not found or assigned to someone else", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_task_status(
    State(store): State<SharedStore>,
    AgentPrincipal(agent): AgentPrincipal,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskStatusRequest>,
) -> ApiResult<Json<TaskEnvelope>> {
    let id: TaskId = id.parse()?;
    let status = services::parse_status(&req.status)?;
    let task = services::update_task_status(store.as_ref(), agent, id, status, Utc::now()).await?;
    Ok(Json(TaskEnvelope {
        message: "Task status updated successfully".to_string(),
        task,
    }))
}

/// GET /api/tasks/stats - Per-status counts of the caller's tasks
#[utoipa::path(
    get,
    path = "/api/tasks/stats",
    tag = "Tasks",
    responses(
        (status = 200, description = "Task statistics", body = TaskStatsResponse),
        (status = 403, description = "Caller is not an agent", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn task_stats(
    State(store): State<SharedStore>,
    AgentPrincipal(agent): AgentPrincipal,
) -> ApiResult<Json<TaskStatsResponse>> {
    let stats = services::task_stats(store.as_ref(), agent).await?;
    Ok(Json(TaskStatsResponse {
        message: "Task statistics retrieved successfully".to_string(),
        stats,
    }))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks))
        .route("/stats", get(task_stats))
        .route("/:id/status", put(update_task_status))
}
