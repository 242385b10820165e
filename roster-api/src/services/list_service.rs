//! List Service
//!
//! Read models for uploads and the cascading delete.

use std::collections::HashMap;

use roster_core::{AdminId, AgentId, ListAggregate, ListId, TaskRecord, TaskStats};
use roster_storage::{DeletionReport, RosterStore};

use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics;
use crate::types::{DistributionDetail, ListDetail};

fn list_not_found(id: ListId) -> ApiError {
    ApiError::entity_not_found("List", id)
}

pub async fn list_uploads(
    store: &dyn RosterStore,
    owner: AdminId,
) -> ApiResult<Vec<ListAggregate>> {
    Ok(store.list_list_by_owner(owner).await?)
}

/// A list with, per distribution, the agent's contact fields, its tasks and
/// their status counts.
pub async fn get_upload_detail(
    store: &dyn RosterStore,
    owner: AdminId,
    id: ListId,
) -> ApiResult<ListDetail> {
    let list = store
        .list_get(id, owner)
        .await?
        .ok_or_else(|| list_not_found(id))?;

    let tasks = store.task_list_by_list(id).await?;
    let status_summary: TaskStats = tasks.iter().map(|t| t.status).collect();

    let mut by_agent: HashMap<AgentId, Vec<TaskRecord>> = HashMap::new();
    for task in tasks {
        by_agent.entry(task.assigned_to).or_default().push(task);
    }

    let mut distributions = Vec::with_capacity(list.distributions.len());
    for distribution in &list.distributions {
        let agent = store.agent_get(distribution.agent_id, owner).await?;
        let tasks = by_agent.remove(&distribution.agent_id).unwrap_or_default();
        distributions.push(DistributionDetail::new(distribution, agent.as_ref(), tasks));
    }

    Ok(ListDetail {
        list_id: list.list_id,
        file_name: list.file_name,
        total_items: list.total_items,
        status: list.status,
        distributions,
        status_summary,
        created_at: list.created_at,
        updated_at: list.updated_at,
    })
}

/// Remove a list and its tasks, and give back the counts it added to each
/// agent. Runs as one atomic store operation.
pub async fn delete_upload(
    store: &dyn RosterStore,
    owner: AdminId,
    id: ListId,
) -> ApiResult<DeletionReport> {
    let report = store
        .list_delete_cascade(id, owner)
        .await?
        .ok_or_else(|| list_not_found(id))?;

    metrics::record(|m| m.record_list_deleted());
    tracing::info!(
        list_id = %id,
        admin_id = %owner,
        tasks_removed = report.tasks_removed,
        counters_reversed = report.counters_reversed.len(),
        "List deleted"
    );
    Ok(report)
}

// =============================================================================
// TESTS
// =============================================================================
