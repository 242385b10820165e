//! Task-related API types

use roster_core::{PageInfo, TaskRecord, TaskStats};
use serde::{Deserialize, Serialize};

/// Query parameters for listing the caller's tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ListTasksQuery {
    /// `pending`, `in_progress` or `completed`
    pub status: Option<String>,
    /// 1-indexed page number (default 1)
    pub page: Option<u32>,
    /// Page size (default 10, max 100)
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListTasksResponse {
    pub message: String,
    pub tasks: Vec<TaskRecord>,
    pub pagination: PageInfo,
}

/// Request to move a task to a new status.
///
/// The status arrives as a plain string so an unknown value can be answered
/// with a field-level validation error instead of a body rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateTaskStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TaskEnvelope {
    pub message: String,
    pub task: TaskRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TaskStatsResponse {
    pub message: String,
    pub stats: TaskStats,
}
