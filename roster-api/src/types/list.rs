//! List (upload) API types

use roster_core::{
    Agent, AgentId, Distribution, ListAggregate, ListId, ListStatus, TaskRecord, TaskStats,
    Timestamp,
};
use serde::{Deserialize, Serialize};

/// Multipart body of an upload: one `file` part with a `.csv`, `.xlsx` or
/// `.xls` file name.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UploadListMultipart {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = Binary))]
    pub file: Vec<u8>,
}

/// A list with every distribution and its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListEnvelope {
    pub message: String,
    pub list: ListAggregate,
}

impl ListEnvelope {
    pub fn new(message: impl Into<String>, list: ListAggregate) -> Self {
        Self {
            message: message.into(),
            list,
        }
    }
}

/// Result of re-applying the missing commits of a failed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResumeUploadResponse {
    pub message: String,
    pub list: ListAggregate,
    /// Distributions committed by this call; 0 when nothing was missing
    pub commits_applied: usize,
}

/// Per-agent slice without its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DistributionSummary {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    pub item_count: usize,
}

/// A list as it appears in the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListSummary {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub list_id: ListId,
    pub file_name: String,
    pub total_items: usize,
    pub status: ListStatus,
    pub distributions: Vec<DistributionSummary>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl From<&ListAggregate> for ListSummary {
    fn from(list: &ListAggregate) -> Self {
        Self {
            list_id: list.list_id,
            file_name: list.file_name.clone(),
            total_items: list.total_items,
            status: list.status,
            distributions: list
                .distributions
                .iter()
                .map(|d| DistributionSummary {
                    agent_id: d.agent_id,
                    item_count: d.item_count,
                })
                .collect(),
            created_at: list.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListListsResponse {
    pub message: String,
    pub lists: Vec<ListSummary>,
    pub count: usize,
}

impl ListListsResponse {
    pub fn new(lists: &[ListAggregate]) -> Self {
        Self {
            message: "Lists retrieved successfully".to_string(),
            lists: lists.iter().map(ListSummary::from).collect(),
            count: lists.len(),
        }
    }
}

/// Contact fields of the agent behind a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentSummary {
    pub name: String,
    pub email: String,
    pub mobile: String,
}

impl From<&Agent> for AgentSummary {
    fn from(agent: &Agent) -> Self {
        Self {
            name: agent.name.clone(),
            email: agent.email.clone(),
            mobile: agent.mobile.clone(),
        }
    }
}

/// One distribution with its live tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DistributionDetail {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    /// `None` once the agent has been deleted
    pub agent: Option<AgentSummary>,
    pub item_count: usize,
    pub tasks: Vec<TaskRecord>,
    pub status_summary: TaskStats,
}

impl DistributionDetail {
    pub fn new(distribution: &Distribution, agent: Option<&Agent>, tasks: Vec<TaskRecord>) -> Self {
        let status_summary = tasks.iter().map(|t| t.status).collect();
        Self {
            agent_id: distribution.agent_id,
            agent: agent.map(AgentSummary::from),
            item_count: distribution.item_count,
            tasks,
            status_summary,
        }
    }
}

/// Everything known about one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListDetail {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub list_id: ListId,
    pub file_name: String,
    pub total_items: usize,
    pub status: ListStatus,
    pub distributions: Vec<DistributionDetail>,
    /// Status counts across every task of the list
    pub status_summary: TaskStats,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListDetailResponse {
    pub message: String,
    pub list: ListDetail,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use roster_core::{AdminId, CanonicalRecord, EntityIdType, TaskStatus};

    fn record(name: &str) -> CanonicalRecord {
        CanonicalRecord {
            first_name: name.to_string(),
            phone: "+15550100".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_summary_drops_items() {
        let dist = Distribution::new(AgentId::now_v7(), vec![record("a"), record("b")]);
        let list = ListAggregate::new(
            "leads.csv",
            AdminId::now_v7(),
            vec![dist],
            ListStatus::Failed,
            Utc::now(),
        );

        let summary = ListSummary::from(&list);
        assert_eq!(summary.total_items, 2);
        assert_eq!(summary.distributions[0].item_count, 2);

        let json = serde_json::to_value(&summary).expect("serialize");
        assert!(json["distributions"][0].get("items").is_none());
    }

    #[test]
    fn test_distribution_detail_counts_statuses() {
        let admin = AdminId::now_v7();
        let list_id = ListId::now_v7();
        let dist = Distribution::new(AgentId::now_v7(), vec![record("a"), record("b")]);
        let mut tasks = dist.to_tasks(list_id, admin, Utc::now());
        tasks[0].apply_status(TaskStatus::Completed, Utc::now());

        let detail = DistributionDetail::new(&dist, None, tasks);
        assert!(detail.agent.is_none());
        assert_eq!(detail.status_summary.completed, 1);
        assert_eq!(detail.status_summary.pending, 1);
        assert_eq!(detail.status_summary.total, 2);
    }
}
