//! OpenAPI Specification for the Roster API
//!
//! Generated by utoipa from the route annotations and schema derives.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::{agent, health, list, task};
use crate::types::*;

use roster_core::{
    Agent, CanonicalRecord, Distribution, ListAggregate, ListStatus, PageInfo, Role, TaskRecord,
    TaskStats, TaskStatus,
};

/// OpenAPI document for the Roster API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Roster API",
        version = "0.1.0",
        description = "Multi-tenant task distribution: agents, uploaded contact lists and the tasks they fan out into",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Agents", description = "Agent management, scoped to the calling admin"),
        (name = "Lists", description = "Upload and five-way distribution of contact lists"),
        (name = "Tasks", description = "An agent's own tasks and their status"),
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        // === Agent Routes ===
        agent::create_agent,
        agent::list_agents,
        agent::get_agent,
        agent::update_agent,
        agent::delete_agent,

        // === List Routes ===
        list::upload_list,
        list::list_lists,
        list::get_list,
        list::delete_list,
        list::resume_list,

        // === Task Routes ===
        task::list_tasks,
        task::update_task_status,
        task::task_stats,

        // === Health Routes ===
        health::ping,
        health::liveness,
        health::readiness,

        // === Metrics ===
        crate::telemetry::metrics::metrics_handler,
    ),
    components(
        schemas(
            // Errors
            ApiError,
            ErrorCode,

            // Domain
            Agent,
            CanonicalRecord,
            Distribution,
            ListAggregate,
            ListStatus,
            TaskRecord,
            TaskStats,
            TaskStatus,
            Role,
            PageInfo,

            // Agent payloads
            CreateAgentRequest,
            UpdateAgentRequest,
            AgentEnvelope,
            ListAgentsResponse,

            // List payloads
            UploadListMultipart,
            ListEnvelope,
            ResumeUploadResponse,
            DistributionSummary,
            ListSummary,
            ListListsResponse,
            AgentSummary,
            DistributionDetail,
            ListDetail,
            ListDetailResponse,

            // Task payloads
            ListTasksResponse,
            UpdateTaskStatusRequest,
            TaskEnvelope,
            TaskStatsResponse,

            MessageResponse,

            // Health
            HealthResponse,
            HealthStatus,
            HealthDetails,
            ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the bearer JWT scheme referenced by every protected route.
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
                        .description(Some("JWT Bearer token carrying the caller's role"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        Self::openapi().to_pretty_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/agents",
            "/api/agents/{id}",
            "/api/lists",
            "/api/lists/upload",
            "/api/lists/{id}",
            "/api/lists/{id}/resume",
            "/api/tasks",
            "/api/tasks/stats",
            "/api/tasks/{id}/status",
            "/health/ready",
            "/metrics",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_openapi_has_bearer_scheme() {
        let json = ApiDoc::to_json().expect("serialize");
        assert!(json.contains("bearer_auth"));
    }
}
