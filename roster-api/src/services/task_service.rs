//! Task Service
//!
//! Agent-facing task reads and the status state machine. Every lookup is
//! scoped to the calling agent, so another agent's task reads as missing.

use roster_core::{
    AgentId, PageInfo, Pagination, TaskId, TaskRecord, TaskStats, TaskStatus, Timestamp,
};
use roster_storage::RosterStore;

use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics;

/// Parse a status string from a request.
pub fn parse_status(raw: &str) -> ApiResult<TaskStatus> {
    raw.parse::<TaskStatus>()
        .map_err(|_| ApiError::invalid_field("status", "Invalid status"))
}

/// A page of the agent's tasks, newest first, plus paging metadata.
pub async fn list_my_tasks(
    store: &dyn RosterStore,
    agent: AgentId,
    status: Option<TaskStatus>,
    pagination: Pagination,
) -> ApiResult<(Vec<TaskRecord>, PageInfo)> {
    let total = store.task_count_for_agent(agent, status).await?;
    let tasks = store
        .task_list_for_agent(agent, status, pagination.offset(), pagination.limit())
        .await?;
    Ok((tasks, pagination.page_info(total)))
}

/// Move one of the agent's tasks to `status`. Any state may follow any
/// other; entering `completed` stamps `completed_at`.
pub async fn update_task_status(
    store: &dyn RosterStore,
    agent: AgentId,
    id: TaskId,
    status: TaskStatus,
    now: Timestamp,
) -> ApiResult<TaskRecord> {
    let task = store
        .task_update_status(id, agent, status, now)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Task", id))?;

    metrics::record(|m| m.record_task_transition(status.as_str()));
    tracing::info!(task_id = %id, agent_id = %agent, status = %status, "Task status updated");
    Ok(task)
}

pub async fn task_stats(store: &dyn RosterStore, agent: AgentId) -> ApiResult<TaskStats> {
    Ok(store.task_stats_for_agent(agent).await?)
}

// =============================================================================
// TESTS
// =============================================================================
