//! Entity types for Roster
//!
//! Plain data. Behaviour is limited to constructors and the few state
//! transitions that must look the same in every store.

use crate::{
    AdminId, AgentId, EntityIdType, ListId, ListStatus, TaskId, TaskStatus, Timestamp,
    ValidationError,
};
use serde::{Deserialize, Serialize};

/// Normalized contact derived from one uploaded row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CanonicalRecord {
    pub first_name: String,
    pub phone: String,
    #[serde(default)]
    pub notes: String,
}

/// An agent managed by an admin.
///
/// `assigned_tasks` is a denormalized counter of every task ever assigned to
/// the agent by a live list. Stores only change it through atomic adds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Agent {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub is_active: bool,
    pub assigned_tasks: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub created_by: AdminId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Agent {
    /// Create a new active agent with no assigned tasks.
    pub fn new(
        created_by: AdminId,
        name: impl Into<String>,
        email: impl Into<String>,
        mobile: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            agent_id: AgentId::now_v7(),
            name: name.into(),
            email: email.into(),
            mobile: mobile.into(),
            is_active: true,
            assigned_tasks: 0,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One agent's slice of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Distribution {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    pub items: Vec<CanonicalRecord>,
    pub item_count: usize,
}

impl Distribution {
    pub fn new(agent_id: AgentId, items: Vec<CanonicalRecord>) -> Self {
        let item_count = items.len();
        Self {
            agent_id,
            items,
            item_count,
        }
    }

    /// Materialize the task records for this slice, all `pending`.
    pub fn to_tasks(
        &self,
        list_id: ListId,
        assigned_by: AdminId,
        now: Timestamp,
    ) -> Vec<TaskRecord> {
        self.items
            .iter()
            .map(|item| TaskRecord::new(item, self.agent_id, assigned_by, list_id, now))
            .collect()
    }
}

/// Durable record of one upload and where its rows went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListAggregate {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub list_id: ListId,
    pub file_name: String,
    pub total_items: usize,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub uploaded_by: AdminId,
    pub distributions: Vec<Distribution>,
    pub status: ListStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl ListAggregate {
    /// Build a list from finished distributions. `total_items` is derived.
    pub fn new(
        file_name: impl Into<String>,
        uploaded_by: AdminId,
        distributions: Vec<Distribution>,
        status: ListStatus,
        now: Timestamp,
    ) -> Self {
        let total_items = distributions.iter().map(|d| d.item_count).sum();
        Self {
            list_id: ListId::now_v7(),
            file_name: file_name.into(),
            total_items,
            uploaded_by,
            distributions,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up the distribution for a given agent.
    pub fn distribution_for(&self, agent_id: AgentId) -> Option<&Distribution> {
        self.distributions.iter().find(|d| d.agent_id == agent_id)
    }

    /// Check the structural invariants of a list.
    pub fn check_invariants(&self) -> Result<(), ValidationError> {
        for dist in &self.distributions {
            if dist.item_count != dist.items.len() {
                return Err(ValidationError::ConstraintViolation {
                    constraint: "item_count".to_string(),
                    reason: format!(
                        "agent {} has item_count {} but {} items",
                        dist.agent_id,
                        dist.item_count,
                        dist.items.len()
                    ),
                });
            }
        }

        let sum: usize = self.distributions.iter().map(|d| d.item_count).sum();
        if sum != self.total_items {
            return Err(ValidationError::ConstraintViolation {
                constraint: "total_items".to_string(),
                reason: format!(
                    "distributions sum to {} but total_items is {}",
                    sum, self.total_items
                ),
            });
        }

        if self.status == ListStatus::Completed
            && self.distributions.len() != crate::AGENTS_PER_LIST
        {
            return Err(ValidationError::ConstraintViolation {
                constraint: "distributions".to_string(),
                reason: format!(
                    "completed list must have {} distributions, found {}",
                    crate::AGENTS_PER_LIST,
                    self.distributions.len()
                ),
            });
        }

        Ok(())
    }
}

/// One unit of work owned by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TaskRecord {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub task_id: TaskId,
    pub first_name: String,
    pub phone: String,
    pub notes: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub assigned_to: AgentId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub assigned_by: AdminId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub list_id: ListId,
    pub status: TaskStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub completed_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl TaskRecord {
    pub fn new(
        record: &CanonicalRecord,
        assigned_to: AgentId,
        assigned_by: AdminId,
        list_id: ListId,
        now: Timestamp,
    ) -> Self {
        Self {
            task_id: TaskId::now_v7(),
            first_name: record.first_name.clone(),
            phone: record.phone.clone(),
            notes: record.notes.clone(),
            assigned_to,
            assigned_by,
            list_id,
            status: TaskStatus::Pending,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status change.
    ///
    /// Entering `Completed` stamps `completed_at`; any other state leaves the
    /// previous stamp in place, so a reopened task keeps its old timestamp.
    pub fn apply_status(&mut self, status: TaskStatus, now: Timestamp) {
        self.status = status;
        if let Some(stamp) = completion_stamp(status, now) {
            self.completed_at = Some(stamp);
        }
        self.updated_at = now;
    }
}

/// The `completed_at` value a transition into `status` writes, if any.
pub fn completion_stamp(status: TaskStatus, now: Timestamp) -> Option<Timestamp> {
    (status == TaskStatus::Completed).then_some(now)
}

/// Per-status task counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TaskStats {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub total: u64,
}

impl TaskStats {
    pub fn record(&mut self, status: TaskStatus) {
        self.add(status, 1);
    }

    pub fn add(&mut self, status: TaskStatus, count: u64) {
        match status {
            TaskStatus::Pending => self.pending += count,
            TaskStatus::InProgress => self.in_progress += count,
            TaskStatus::Completed => self.completed += count,
        }
        self.total += count;
    }
}

impl FromIterator<TaskStatus> for TaskStats {
    fn from_iter<I: IntoIterator<Item = TaskStatus>>(iter: I) -> Self {
        let mut stats = TaskStats::default();
        for status in iter {
            stats.record(status);
        }
        stats
    }
}
