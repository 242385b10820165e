//! In-memory store.
//!
//! All tables sit behind one `RwLock`, so each compound operation runs under
//! a single write guard and is atomic with respect to every other call.

use crate::{AgentUpdate, CommitOutcome, DeletionReport, RosterStore};
use async_trait::async_trait;
use roster_core::{
    entities::completion_stamp, AdminId, Agent, AgentId, Distribution, EntityIdType, EntityType,
    ListAggregate, ListId, ListStatus, RosterResult, StorageError, TaskId, TaskRecord, TaskStats,
    TaskStatus, Timestamp,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    agents: HashMap<AgentId, Agent>,
    lists: HashMap<ListId, ListAggregate>,
    // Keyed by UUIDv7, so iteration order is creation order.
    tasks: BTreeMap<TaskId, TaskRecord>,
    commits: HashSet<(ListId, AgentId)>,
    failing_commits: HashSet<AgentId>,
}

impl Tables {
    fn conflict_for(
        &self,
        owner: AdminId,
        email: Option<&str>,
        mobile: Option<&str>,
        exclude: Option<AgentId>,
    ) -> Option<&Agent> {
        self.agents.values().find(|agent| {
            agent.created_by == owner
                && Some(agent.agent_id) != exclude
                && (email.is_some_and(|e| agent.email == e)
                    || mobile.is_some_and(|m| agent.mobile == m))
        })
    }
}

fn unique_violation(email: &str, existing: &Agent) -> StorageError {
    let constraint = if existing.email == email {
        "agents_owner_email_key"
    } else {
        "agents_owner_mobile_key"
    };
    StorageError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

fn newest_first_agents(agents: &mut [Agent]) {
    agents.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.agent_id.cmp(&a.agent_id))
    });
}

/// In-memory [`RosterStore`] used by tests and the `memory` backend.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StorageError> {
        self.tables.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StorageError> {
        self.tables.write().map_err(|_| StorageError::LockPoisoned)
    }

    /// Make every future commit for `agent_id` fail until cleared.
    /// Lets tests exercise a partially distributed upload.
    pub fn fail_commits_for(&self, agent_id: AgentId) -> RosterResult<()> {
        self.write()?.failing_commits.insert(agent_id);
        Ok(())
    }

    pub fn clear_commit_failures(&self) -> RosterResult<()> {
        self.write()?.failing_commits.clear();
        Ok(())
    }

    pub fn task_count(&self) -> RosterResult<usize> {
        Ok(self.read()?.tasks.len())
    }

    pub fn list_count(&self) -> RosterResult<usize> {
        Ok(self.read()?.lists.len())
    }
}

#[async_trait]
impl RosterStore for InMemoryStore {
    // === Agent Operations ===

    async fn agent_insert(&self, agent: &Agent) -> RosterResult<()> {
        let mut tables = self.write()?;
        if tables.agents.contains_key(&agent.agent_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Agent,
                reason: "already exists".to_string(),
            }
            .into());
        }
        if let Some(existing) = tables.conflict_for(
            agent.created_by,
            Some(agent.email.as_str()),
            Some(agent.mobile.as_str()),
            None,
        ) {
            return Err(unique_violation(&agent.email, existing).into());
        }
        tables.agents.insert(agent.agent_id, agent.clone());
        Ok(())
    }

    async fn agent_get(&self, id: AgentId, owner: AdminId) -> RosterResult<Option<Agent>> {
        let tables = self.read()?;
        Ok(tables
            .agents
            .get(&id)
            .filter(|agent| agent.created_by == owner)
            .cloned())
    }

    async fn agent_list_by_owner(&self, owner: AdminId) -> RosterResult<Vec<Agent>> {
        let tables = self.read()?;
        let mut agents: Vec<Agent> = tables
            .agents
            .values()
            .filter(|agent| agent.created_by == owner)
            .cloned()
            .collect();
        newest_first_agents(&mut agents);
        Ok(agents)
    }

    async fn agent_list_active(&self, owner: AdminId) -> RosterResult<Vec<Agent>> {
        let tables = self.read()?;
        let mut agents: Vec<Agent> = tables
            .agents
            .values()
            .filter(|agent| agent.created_by == owner && agent.is_active)
            .cloned()
            .collect();
        newest_first_agents(&mut agents);
        Ok(agents)
    }

    async fn agent_find_conflict(
        &self,
        owner: AdminId,
        email: Option<&str>,
        mobile: Option<&str>,
        exclude: Option<AgentId>,
    ) -> RosterResult<Option<Agent>> {
        let tables = self.read()?;
        Ok(tables.conflict_for(owner, email, mobile, exclude).cloned())
    }

    async fn agent_update(
        &self,
        id: AgentId,
        owner: AdminId,
        update: AgentUpdate,
        now: Timestamp,
    ) -> RosterResult<Option<Agent>> {
        let mut tables = self.write()?;
        match tables.agents.get(&id) {
            Some(agent) if agent.created_by == owner => {}
            _ => return Ok(None),
        }

        if let Some(existing) = tables.conflict_for(
            owner,
            update.email.as_deref(),
            update.mobile.as_deref(),
            Some(id),
        ) {
            let email = update.email.as_deref().unwrap_or_default();
            return Err(unique_violation(email, existing).into());
        }

        let Some(agent) = tables.agents.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            agent.name = name;
        }
        if let Some(email) = update.email {
            agent.email = email;
        }
        if let Some(mobile) = update.mobile {
            agent.mobile = mobile;
        }
        if let Some(is_active) = update.is_active {
            agent.is_active = is_active;
        }
        agent.updated_at = now;
        Ok(Some(agent.clone()))
    }

    async fn agent_delete(&self, id: AgentId, owner: AdminId) -> RosterResult<bool> {
        let mut tables = self.write()?;
        let owned = tables
            .agents
            .get(&id)
            .is_some_and(|agent| agent.created_by == owner);
        if owned {
            tables.agents.remove(&id);
        }
        Ok(owned)
    }

    // === List Operations ===

    async fn list_insert(&self, list: &ListAggregate) -> RosterResult<()> {
        let mut tables = self.write()?;
        if tables.lists.contains_key(&list.list_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::List,
                reason: "already exists".to_string(),
            }
            .into());
        }
        tables.lists.insert(list.list_id, list.clone());
        Ok(())
    }

    async fn list_get(&self, id: ListId, owner: AdminId) -> RosterResult<Option<ListAggregate>> {
        let tables = self.read()?;
        Ok(tables
            .lists
            .get(&id)
            .filter(|list| list.uploaded_by == owner)
            .cloned())
    }

    async fn list_list_by_owner(&self, owner: AdminId) -> RosterResult<Vec<ListAggregate>> {
        let tables = self.read()?;
        let mut lists: Vec<ListAggregate> = tables
            .lists
            .values()
            .filter(|list| list.uploaded_by == owner)
            .cloned()
            .collect();
        lists.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.list_id.cmp(&a.list_id))
        });
        Ok(lists)
    }

    async fn list_set_status(
        &self,
        id: ListId,
        status: ListStatus,
        now: Timestamp,
    ) -> RosterResult<()> {
        let mut tables = self.write()?;
        let list = tables
            .lists
            .get_mut(&id)
            .ok_or(StorageError::NotFound {
                entity_type: EntityType::List,
                id: id.as_uuid(),
            })?;
        list.status = status;
        list.updated_at = now;
        Ok(())
    }

    async fn distribution_commit(
        &self,
        list_id: ListId,
        distribution: &Distribution,
        tasks: &[TaskRecord],
    ) -> RosterResult<CommitOutcome> {
        let agent_id = distribution.agent_id;
        let mut tables = self.write()?;

        if tables.commits.contains(&(list_id, agent_id)) {
            return Ok(CommitOutcome::AlreadyApplied);
        }
        if tables.failing_commits.contains(&agent_id) {
            return Err(StorageError::TransactionFailed {
                reason: format!("commit for agent {} rejected", agent_id),
            }
            .into());
        }
        if !tables.lists.contains_key(&list_id) {
            return Err(StorageError::NotFound {
                entity_type: EntityType::List,
                id: list_id.as_uuid(),
            }
            .into());
        }

        let increment = i64::try_from(distribution.item_count).map_err(|_| {
            StorageError::TransactionFailed {
                reason: "item count overflows counter".to_string(),
            }
        })?;
        let agent = tables
            .agents
            .get_mut(&agent_id)
            .ok_or(StorageError::NotFound {
                entity_type: EntityType::Agent,
                id: agent_id.as_uuid(),
            })?;
        agent.assigned_tasks += increment;

        for task in tasks {
            tables.tasks.insert(task.task_id, task.clone());
        }
        tables.commits.insert((list_id, agent_id));
        Ok(CommitOutcome::Applied)
    }

    async fn distribution_committed(&self, list_id: ListId) -> RosterResult<Vec<AgentId>> {
        let tables = self.read()?;
        let mut agents: Vec<AgentId> = tables
            .commits
            .iter()
            .filter(|(list, _)| *list == list_id)
            .map(|(_, agent)| *agent)
            .collect();
        agents.sort();
        Ok(agents)
    }

    async fn list_delete_cascade(
        &self,
        id: ListId,
        owner: AdminId,
    ) -> RosterResult<Option<DeletionReport>> {
        let mut tables = self.write()?;
        let Some(list) = tables
            .lists
            .get(&id)
            .filter(|list| list.uploaded_by == owner)
            .cloned()
        else {
            return Ok(None);
        };

        let before = tables.tasks.len();
        tables.tasks.retain(|_, task| task.list_id != id);
        let tasks_removed = (before - tables.tasks.len()) as u64;

        let mut counters_reversed = Vec::new();
        for dist in &list.distributions {
            if !tables.commits.remove(&(id, dist.agent_id)) {
                continue;
            }
            let decrement = dist.item_count as i64;
            if let Some(agent) = tables.agents.get_mut(&dist.agent_id) {
                agent.assigned_tasks = (agent.assigned_tasks - decrement).max(0);
            }
            counters_reversed.push((dist.agent_id, decrement));
        }
        // Ledger rows for agents no longer in the distribution list.
        tables.commits.retain(|(list_id, _)| *list_id != id);
        tables.lists.remove(&id);

        Ok(Some(DeletionReport {
            tasks_removed,
            counters_reversed,
        }))
    }

    // === Task Operations ===

    async fn task_get(&self, id: TaskId, assigned_to: AgentId) -> RosterResult<Option<TaskRecord>> {
        let tables = self.read()?;
        Ok(tables
            .tasks
            .get(&id)
            .filter(|task| task.assigned_to == assigned_to)
            .cloned())
    }

    async fn task_list_for_agent(
        &self,
        assigned_to: AgentId,
        status: Option<TaskStatus>,
        offset: usize,
        limit: usize,
    ) -> RosterResult<Vec<TaskRecord>> {
        let tables = self.read()?;
        let mut tasks: Vec<&TaskRecord> = tables
            .tasks
            .values()
            .filter(|task| task.assigned_to == assigned_to)
            .filter(|task| status.map_or(true, |s| task.status == s))
            .collect();
        tasks.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.task_id.cmp(&a.task_id))
        });
        Ok(tasks.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn task_count_for_agent(
        &self,
        assigned_to: AgentId,
        status: Option<TaskStatus>,
    ) -> RosterResult<u64> {
        let tables = self.read()?;
        Ok(tables
            .tasks
            .values()
            .filter(|task| task.assigned_to == assigned_to)
            .filter(|task| status.map_or(true, |s| task.status == s))
            .count() as u64)
    }

    async fn task_update_status(
        &self,
        id: TaskId,
        assigned_to: AgentId,
        status: TaskStatus,
        now: Timestamp,
    ) -> RosterResult<Option<TaskRecord>> {
        let mut tables = self.write()?;
        let Some(task) = tables
            .tasks
            .get_mut(&id)
            .filter(|task| task.assigned_to == assigned_to)
        else {
            return Ok(None);
        };
        task.status = status;
        if let Some(stamp) = completion_stamp(status, now) {
            task.completed_at = Some(stamp);
        }
        task.updated_at = now;
        Ok(Some(task.clone()))
    }

    async fn task_list_by_list(&self, list_id: ListId) -> RosterResult<Vec<TaskRecord>> {
        let tables = self.read()?;
        Ok(tables
            .tasks
            .values()
            .filter(|task| task.list_id == list_id)
            .cloned()
            .collect())
    }

    async fn task_stats_for_agent(&self, assigned_to: AgentId) -> RosterResult<TaskStats> {
        let tables = self.read()?;
        Ok(tables
            .tasks
            .values()
            .filter(|task| task.assigned_to == assigned_to)
            .map(|task| task.status)
            .collect())
    }

    async fn health_check(&self) -> RosterResult<()> {
        self.read()?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use roster_core::{distribute, CanonicalRecord, RosterError};

    fn make_agent(owner: AdminId, i: usize) -> Agent {
        Agent::new(
            owner,
            format!("Agent {}", i),
            format!("agent{}@example.com", i),
            format!("+1555000{:04}", i),
            Utc::now(),
        )
    }

    fn records(n: usize) -> Vec<CanonicalRecord> {
        (0..n)
            .map(|i| CanonicalRecord {
                first_name: format!("c{}", i),
                phone: format!("+1{}", i),
                notes: String::new(),
            })
            .collect()
    }

    async fn seed_agents(store: &InMemoryStore, owner: AdminId, n: usize) -> Vec<Agent> {
        let mut agents = Vec::new();
        for i in 0..n {
            let agent = make_agent(owner, i);
            store.agent_insert(&agent).await.expect("insert agent");
            agents.push(agent);
        }
        agents
    }

    async fn seed_list(
        store: &InMemoryStore,
        owner: AdminId,
        agents: &[Agent],
        n: usize,
    ) -> ListAggregate {
        let dists = distribute(records(n), agents).expect("distribute");
        let list =
            ListAggregate::new("contacts.csv", owner, dists, ListStatus::Completed, Utc::now());
        store.list_insert(&list).await.expect("insert list");
        list
    }

    async fn commit_all(
        store: &InMemoryStore,
        list: &ListAggregate,
    ) -> Vec<RosterResult<CommitOutcome>> {
        let mut out = Vec::new();
        for dist in &list.distributions {
            let tasks = dist.to_tasks(list.list_id, list.uploaded_by, Utc::now());
            out.push(store.distribution_commit(list.list_id, dist, &tasks).await);
        }
        out
    }

    async fn counters(store: &InMemoryStore, owner: AdminId) -> HashMap<AgentId, i64> {
        store
            .agent_list_by_owner(owner)
            .await
            .expect("list agents")
            .into_iter()
            .map(|a| (a.agent_id, a.assigned_tasks))
            .collect()
    }

    #[tokio::test]
    async fn test_not_found_returns_none() {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        assert!(store.agent_get(AgentId::now_v7(), owner).await.unwrap().is_none());
        assert!(store.list_get(ListId::now_v7(), owner).await.unwrap().is_none());
        assert!(store
            .task_get(TaskId::now_v7(), AgentId::now_v7())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_agents_are_owner_scoped() {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        let other = AdminId::now_v7();
        let agents = seed_agents(&store, owner, 1).await;

        assert!(store.agent_get(agents[0].agent_id, other).await.unwrap().is_none());
        assert!(!store.agent_delete(agents[0].agent_id, other).await.unwrap());
        assert!(store.agent_list_by_owner(other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_for_same_owner_rejected() {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        let first = make_agent(owner, 1);
        store.agent_insert(&first).await.unwrap();

        let mut dup = make_agent(owner, 2);
        dup.email = first.email.clone();
        let err = store.agent_insert(&dup).await.unwrap_err();
        assert!(matches!(
            err,
            RosterError::Storage(StorageError::UniqueViolation { .. })
        ));

        // Another owner may reuse it.
        let mut elsewhere = make_agent(AdminId::now_v7(), 3);
        elsewhere.email = first.email.clone();
        store.agent_insert(&elsewhere).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_conflict_excludes_self() {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        let agents = seed_agents(&store, owner, 2).await;

        let same = AgentUpdate {
            email: Some(agents[0].email.clone()),
            ..Default::default()
        };
        let updated = store
            .agent_update(agents[0].agent_id, owner, same, Utc::now())
            .await
            .unwrap();
        assert!(updated.is_some());

        let steal = AgentUpdate {
            mobile: Some(agents[1].mobile.clone()),
            ..Default::default()
        };
        assert!(store
            .agent_update(agents[0].agent_id, owner, steal, Utc::now())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_active_agents_newest_first() {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        let base = Utc::now();
        let mut ids = Vec::new();
        for i in 0..4 {
            let mut agent = make_agent(owner, i);
            agent.created_at = base + chrono::Duration::seconds(i as i64);
            agent.is_active = i != 2;
            store.agent_insert(&agent).await.unwrap();
            ids.push(agent.agent_id);
        }
        let active: Vec<_> = store
            .agent_list_active(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.agent_id)
            .collect();
        assert_eq!(active, vec![ids[3], ids[1], ids[0]]);
    }

    #[tokio::test]
    async fn test_commit_is_idempotent() {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        let agents = seed_agents(&store, owner, 5).await;
        let list = seed_list(&store, owner, &agents, 12).await;

        let first = commit_all(&store, &list).await;
        assert!(first.iter().all(|r| matches!(r, Ok(CommitOutcome::Applied))));
        let second = commit_all(&store, &list).await;
        assert!(second
            .iter()
            .all(|r| matches!(r, Ok(CommitOutcome::AlreadyApplied))));

        assert_eq!(store.task_count().unwrap(), 12);
        let total: i64 = counters(&store, owner).await.values().sum();
        assert_eq!(total, 12);
    }

    #[tokio::test]
    async fn test_delete_cascade_restores_counters() {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        let agents = seed_agents(&store, owner, 5).await;
        let before = counters(&store, owner).await;

        let list = seed_list(&store, owner, &agents, 12).await;
        commit_all(&store, &list).await;

        let report = store
            .list_delete_cascade(list.list_id, owner)
            .await
            .unwrap()
            .expect("list exists");
        assert_eq!(report.tasks_removed, 12);
        assert_eq!(report.counters_reversed.len(), 5);

        assert_eq!(counters(&store, owner).await, before);
        assert!(store.task_list_by_list(list.list_id).await.unwrap().is_empty());
        assert!(store.distribution_committed(list.list_id).await.unwrap().is_empty());
        assert!(store.list_get(list.list_id, owner).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_cascade_only_reverses_committed() {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        let agents = seed_agents(&store, owner, 5).await;
        let list = seed_list(&store, owner, &agents, 10).await;

        store.fail_commits_for(list.distributions[2].agent_id).unwrap();
        let results = commit_all(&store, &list).await;
        assert!(results[2].is_err());
        assert_eq!(store.distribution_committed(list.list_id).await.unwrap().len(), 4);

        store.list_delete_cascade(list.list_id, owner).await.unwrap();
        assert!(counters(&store, owner).await.values().all(|&c| c == 0));
        assert_eq!(store.task_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_cascade_wrong_owner_is_none() {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        let agents = seed_agents(&store, owner, 5).await;
        let list = seed_list(&store, owner, &agents, 5).await;

        let result = store
            .list_delete_cascade(list.list_id, AdminId::now_v7())
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(store.list_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_counter_never_negative() {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        let agents = seed_agents(&store, owner, 5).await;
        let list = seed_list(&store, owner, &agents, 10).await;
        commit_all(&store, &list).await;

        // Simulate drift: reset one counter by hand before deleting.
        {
            let mut tables = store.write().unwrap();
            let agent = tables.agents.get_mut(&agents[0].agent_id).unwrap();
            agent.assigned_tasks = 0;
        }
        store.list_delete_cascade(list.list_id, owner).await.unwrap();
        assert!(counters(&store, owner).await.values().all(|&c| c >= 0));
    }

    #[tokio::test]
    async fn test_task_status_update_scoped_to_assignee() {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        let agents = seed_agents(&store, owner, 5).await;
        let list = seed_list(&store, owner, &agents, 5).await;
        commit_all(&store, &list).await;

        let task = store.task_list_by_list(list.list_id).await.unwrap()[0].clone();
        let stranger = agents
            .iter()
            .find(|a| a.agent_id != task.assigned_to)
            .unwrap()
            .agent_id;

        let denied = store
            .task_update_status(task.task_id, stranger, TaskStatus::Completed, Utc::now())
            .await
            .unwrap();
        assert!(denied.is_none());

        let now = Utc::now();
        let done = store
            .task_update_status(task.task_id, task.assigned_to, TaskStatus::Completed, now)
            .await
            .unwrap()
            .expect("owner can update");
        assert_eq!(done.completed_at, Some(now));

        let reopened = store
            .task_update_status(task.task_id, task.assigned_to, TaskStatus::Pending, Utc::now())
            .await
            .unwrap()
            .expect("owner can update");
        assert_eq!(reopened.completed_at, Some(now));
    }

    #[tokio::test]
    async fn test_task_paging_and_stats() {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        let agents = seed_agents(&store, owner, 5).await;
        let list = seed_list(&store, owner, &agents, 30).await;
        commit_all(&store, &list).await;

        let agent = list.distributions[0].agent_id;
        let all = store.task_list_for_agent(agent, None, 0, 100).await.unwrap();
        assert_eq!(all.len(), 6);

        let page = store.task_list_for_agent(agent, None, 4, 4).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].task_id, all[4].task_id);

        store
            .task_update_status(all[0].task_id, agent, TaskStatus::InProgress, Utc::now())
            .await
            .unwrap();
        store
            .task_update_status(all[1].task_id, agent, TaskStatus::Completed, Utc::now())
            .await
            .unwrap();

        let stats = store.task_stats_for_agent(agent).await.unwrap();
        assert_eq!(
            stats,
            TaskStats {
                pending: 4,
                in_progress: 1,
                completed: 1,
                total: 6
            }
        );
        assert_eq!(
            store
                .task_count_for_agent(agent, Some(TaskStatus::Pending))
                .await
                .unwrap(),
            4
        );
        let completed = store
            .task_list_for_agent(agent, Some(TaskStatus::Completed), 0, 10)
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use roster_core::{distribute, CanonicalRecord};

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime")
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Upload then delete leaves every counter where it started and no
        /// tasks behind, whichever commits failed in between.
        #[test]
        fn prop_upload_then_delete_restores_counters(
            n in 0usize..80,
            initial in proptest::collection::vec(0i64..20, 5),
            failing in proptest::collection::vec(any::<bool>(), 5),
        ) {
            let rt = runtime();
            rt.block_on(async {
                let store = InMemoryStore::new();
                let owner = AdminId::now_v7();
                let mut agents = Vec::new();
                for (i, start) in initial.iter().enumerate() {
                    let mut agent = Agent::new(
                        owner,
                        format!("A{}", i),
                        format!("a{}@x.io", i),
                        format!("+1999{:04}", i),
                        Utc::now(),
                    );
                    agent.assigned_tasks = *start;
                    store.agent_insert(&agent).await.unwrap();
                    agents.push(agent);
                }

                let items: Vec<CanonicalRecord> = (0..n)
                    .map(|i| CanonicalRecord {
                        first_name: format!("n{}", i),
                        phone: format!("{}", i),
                        notes: String::new(),
                    })
                    .collect();
                let dists = distribute(items, &agents).unwrap();
                let list =
                    ListAggregate::new("f.csv", owner, dists, ListStatus::Completed, Utc::now());
                store.list_insert(&list).await.unwrap();

                for (agent, fail) in agents.iter().zip(&failing) {
                    if *fail {
                        store.fail_commits_for(agent.agent_id).unwrap();
                    }
                }
                for dist in &list.distributions {
                    let tasks = dist.to_tasks(list.list_id, owner, Utc::now());
                    let _ = store.distribution_commit(list.list_id, dist, &tasks).await;
                }

                store.list_delete_cascade(list.list_id, owner).await.unwrap();

                for (agent, start) in agents.iter().zip(&initial) {
                    let current = store.agent_get(agent.agent_id, owner).await.unwrap().unwrap();
                    prop_assert_eq!(current.assigned_tasks, *start);
                }
                prop_assert_eq!(store.task_count().unwrap(), 0);
                Ok(())
            })?;
        }
    }
}
