//! Async storage trait for Roster entities.
//!
//! Every read is scoped by its owner (`created_by`, `uploaded_by` or
//! `assigned_to`), so a missing entity and someone else's entity look the
//! same to callers. Compound writes (`distribution_commit`,
//! `list_delete_cascade`) must be atomic in every implementation.

use crate::{AgentUpdate, CommitOutcome, DeletionReport};
use async_trait::async_trait;
use roster_core::{
    AdminId, Agent, AgentId, Distribution, ListAggregate, ListId, ListStatus, RosterResult,
    TaskId, TaskRecord, TaskStats, TaskStatus, Timestamp,
};

#[async_trait]
pub trait RosterStore: Send + Sync {
    // ========================================================================
    // AGENT OPERATIONS
    // ========================================================================

    /// Insert a new agent. Fails with `UniqueViolation` when the owner
    /// already has an agent with the same email or mobile.
    async fn agent_insert(&self, agent: &Agent) -> RosterResult<()>;

    async fn agent_get(&self, id: AgentId, owner: AdminId) -> RosterResult<Option<Agent>>;

    /// All agents of an owner, newest first.
    async fn agent_list_by_owner(&self, owner: AdminId) -> RosterResult<Vec<Agent>>;

    /// Active agents of an owner, newest first (ties broken by id, descending).
    async fn agent_list_active(&self, owner: AdminId) -> RosterResult<Vec<Agent>>;

    /// Find an agent of `owner` that already uses `email` or `mobile`,
    /// ignoring `exclude`.
    async fn agent_find_conflict(
        &self,
        owner: AdminId,
        email: Option<&str>,
        mobile: Option<&str>,
        exclude: Option<AgentId>,
    ) -> RosterResult<Option<Agent>>;

    /// Apply an update. Returns `None` when the agent is absent or not owned.
    async fn agent_update(
        &self,
        id: AgentId,
        owner: AdminId,
        update: AgentUpdate,
        now: Timestamp,
    ) -> RosterResult<Option<Agent>>;

    /// Returns whether an agent was removed.
    async fn agent_delete(&self, id: AgentId, owner: AdminId) -> RosterResult<bool>;

    // ========================================================================
    // LIST OPERATIONS
    // ========================================================================

    async fn list_insert(&self, list: &ListAggregate) -> RosterResult<()>;

    async fn list_get(&self, id: ListId, owner: AdminId) -> RosterResult<Option<ListAggregate>>;

    /// All lists of an owner, newest first.
    async fn list_list_by_owner(&self, owner: AdminId) -> RosterResult<Vec<ListAggregate>>;

    async fn list_set_status(
        &self,
        id: ListId,
        status: ListStatus,
        now: Timestamp,
    ) -> RosterResult<()>;

    /// Atomically insert a distribution's tasks, add `item_count` to the
    /// agent's counter and record `(list_id, agent_id)` in the ledger.
    /// A pair already in the ledger is a no-op.
    async fn distribution_commit(
        &self,
        list_id: ListId,
        distribution: &Distribution,
        tasks: &[TaskRecord],
    ) -> RosterResult<CommitOutcome>;

    /// Agents whose distribution for `list_id` has been committed.
    async fn distribution_committed(&self, list_id: ListId) -> RosterResult<Vec<AgentId>>;

    /// Atomically remove a list, its tasks and its ledger entries, and
    /// subtract each committed distribution from its agent's counter
    /// (never below zero). Returns `None` when the list is absent or not owned.
    async fn list_delete_cascade(
        &self,
        id: ListId,
        owner: AdminId,
    ) -> RosterResult<Option<DeletionReport>>;

    // ========================================================================
    // TASK OPERATIONS
    // ========================================================================

    async fn task_get(&self, id: TaskId, assigned_to: AgentId) -> RosterResult<Option<TaskRecord>>;

    /// A page of an agent's tasks, newest first.
    async fn task_list_for_agent(
        &self,
        assigned_to: AgentId,
        status: Option<TaskStatus>,
        offset: usize,
        limit: usize,
    ) -> RosterResult<Vec<TaskRecord>>;

    async fn task_count_for_agent(
        &self,
        assigned_to: AgentId,
        status: Option<TaskStatus>,
    ) -> RosterResult<u64>;

    /// Set a task's status. Entering `Completed` stamps `completed_at` with
    /// `now`. Returns `None` when the task is absent or assigned elsewhere.
    async fn task_update_status(
        &self,
        id: TaskId,
        assigned_to: AgentId,
        status: TaskStatus,
        now: Timestamp,
    ) -> RosterResult<Option<TaskRecord>>;

    /// Tasks of a list, oldest first.
    async fn task_list_by_list(&self, list_id: ListId) -> RosterResult<Vec<TaskRecord>>;

    async fn task_stats_for_agent(&self, assigned_to: AgentId) -> RosterResult<TaskStats>;

    // ========================================================================
    // HEALTH
    // ========================================================================

    async fn health_check(&self) -> RosterResult<()>;
}
