//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres and the
//! `RosterStore` implementation on top of it. Compound operations
//! (`distribution_commit`, `list_delete_cascade`) run inside one SQL
//! transaction each. Counter changes are in-place `assigned_tasks + $n`
//! updates, never read-modify-write.

use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolError, RecyclingMethod, Runtime};
use roster_core::{
    entities::completion_stamp, AdminId, Agent, AgentId, Distribution, EntityIdType, EntityType,
    ListAggregate, ListId, ListStatus, RosterError, RosterResult, StorageError, TaskId,
    TaskRecord, TaskStats, TaskStatus, Timestamp,
};
use roster_storage::{AgentUpdate, CommitOutcome, DeletionReport, RosterStore};
use std::time::Duration;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::Json;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

/// Schema bootstrap, applied by [`DbClient::migrate`].
pub const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

const AGENT_COLUMNS: &str =
    "agent_id, name, email, mobile, is_active, assigned_tasks, created_by, created_at, updated_at";
const LIST_COLUMNS: &str =
    "list_id, file_name, total_items, uploaded_by, distributions, status, created_at, updated_at";
const TASK_COLUMNS: &str = "task_id, first_name, phone, notes, assigned_to, assigned_by, list_id, \
                            status, completed_at, created_at, updated_at";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait timeout when acquiring a connection
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "roster".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from `ROSTER_DB_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("ROSTER_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("ROSTER_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("ROSTER_DB_NAME").unwrap_or_else(|_| "roster".to_string()),
            user: std::env::var("ROSTER_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("ROSTER_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("ROSTER_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("ROSTER_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn storage_err(err: tokio_postgres::Error) -> RosterError {
    if let Some(db_err) = err.as_db_error() {
        if db_err.code() == &SqlState::UNIQUE_VIOLATION {
            return StorageError::UniqueViolation {
                constraint: db_err.constraint().unwrap_or("unknown").to_string(),
            }
            .into();
        }
    }
    tracing::error!("Database error: {:?}", err);
    StorageError::Database {
        reason: err.to_string(),
    }
    .into()
}

fn pool_err(err: PoolError) -> RosterError {
    tracing::error!("Connection pool error: {:?}", err);
    StorageError::Database {
        reason: format!("Failed to acquire database connection: {}", err),
    }
    .into()
}

fn decode_err(column: &str, reason: impl std::fmt::Display) -> RosterError {
    StorageError::Database {
        reason: format!("Invalid value in column {}: {}", column, reason),
    }
    .into()
}

fn not_found(entity_type: EntityType, id: Uuid) -> RosterError {
    StorageError::NotFound { entity_type, id }.into()
}

fn to_i64(value: usize, column: &str) -> RosterResult<i64> {
    i64::try_from(value).map_err(|e| decode_err(column, e))
}

// ============================================================================
// ROW DECODING
// ============================================================================

fn agent_from_row(row: &Row) -> RosterResult<Agent> {
    Ok(Agent {
        agent_id: AgentId::new(row.try_get("agent_id").map_err(storage_err)?),
        name: row.try_get("name").map_err(storage_err)?,
        email: row.try_get("email").map_err(storage_err)?,
        mobile: row.try_get("mobile").map_err(storage_err)?,
        is_active: row.try_get("is_active").map_err(storage_err)?,
        assigned_tasks: row.try_get("assigned_tasks").map_err(storage_err)?,
        created_by: AdminId::new(row.try_get("created_by").map_err(storage_err)?),
        created_at: row.try_get("created_at").map_err(storage_err)?,
        updated_at: row.try_get("updated_at").map_err(storage_err)?,
    })
}

fn list_from_row(row: &Row) -> RosterResult<ListAggregate> {
    let total_items: i64 = row.try_get("total_items").map_err(storage_err)?;
    let Json(distributions): Json<Vec<Distribution>> =
        row.try_get("distributions").map_err(storage_err)?;
    let status: String = row.try_get("status").map_err(storage_err)?;

    Ok(ListAggregate {
        list_id: ListId::new(row.try_get("list_id").map_err(storage_err)?),
        file_name: row.try_get("file_name").map_err(storage_err)?,
        total_items: usize::try_from(total_items).map_err(|e| decode_err("total_items", e))?,
        uploaded_by: AdminId::new(row.try_get("uploaded_by").map_err(storage_err)?),
        distributions,
        status: status.parse().map_err(|e| decode_err("status", e))?,
        created_at: row.try_get("created_at").map_err(storage_err)?,
        updated_at: row.try_get("updated_at").map_err(storage_err)?,
    })
}

fn task_from_row(row: &Row) -> RosterResult<TaskRecord> {
    let status: String = row.try_get("status").map_err(storage_err)?;

    Ok(TaskRecord {
        task_id: TaskId::new(row.try_get("task_id").map_err(storage_err)?),
        first_name: row.try_get("first_name").map_err(storage_err)?,
        phone: row.try_get("phone").map_err(storage_err)?,
        notes: row.try_get("notes").map_err(storage_err)?,
        assigned_to: AgentId::new(row.try_get("assigned_to").map_err(storage_err)?),
        assigned_by: AdminId::new(row.try_get("assigned_by").map_err(storage_err)?),
        list_id: ListId::new(row.try_get("list_id").map_err(storage_err)?),
        status: status.parse().map_err(|e| decode_err("status", e))?,
        completed_at: row.try_get("completed_at").map_err(storage_err)?,
        created_at: row.try_get("created_at").map_err(storage_err)?,
        updated_at: row.try_get("updated_at").map_err(storage_err)?,
    })
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Postgres-backed [`RosterStore`].
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Current pool size, for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Apply [`SCHEMA_SQL`]. Safe to run on every start.
    pub async fn migrate(&self) -> ApiResult<()> {
        let conn = self.pool.get().await?;
        conn.batch_execute(SCHEMA_SQL).await?;
        tracing::info!("Database schema applied");
        Ok(())
    }

    async fn get_conn(&self) -> RosterResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(pool_err)
    }
}

#[async_trait]
impl RosterStore for DbClient {
    // ========================================================================
    // AGENT OPERATIONS
    // ========================================================================

    async fn agent_insert(&self, agent: &Agent) -> RosterResult<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            &format!(
                "INSERT INTO agents ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                AGENT_COLUMNS
            ),
            &[
                &agent.agent_id.as_uuid(),
                &agent.name,
                &agent.email,
                &agent.mobile,
                &agent.is_active,
                &agent.assigned_tasks,
                &agent.created_by.as_uuid(),
                &agent.created_at,
                &agent.updated_at,
            ],
        )
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn agent_get(&self, id: AgentId, owner: AdminId) -> RosterResult<Option<Agent>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                &format!(
                    "SELECT {} FROM agents WHERE agent_id = $1 AND created_by = $2",
                    AGENT_COLUMNS
                ),
                &[&id.as_uuid(), &owner.as_uuid()],
            )
            .await
            .map_err(storage_err)?;
        row.as_ref().map(agent_from_row).transpose()
    }

    async fn agent_list_by_owner(&self, owner: AdminId) -> RosterResult<Vec<Agent>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {} FROM agents WHERE created_by = $1 \
                     ORDER BY created_at DESC, agent_id DESC",
                    AGENT_COLUMNS
                ),
                &[&owner.as_uuid()],
            )
            .await
            .map_err(storage_err)?;
        rows.iter().map(agent_from_row).collect()
    }

    async fn agent_list_active(&self, owner: AdminId) -> RosterResult<Vec<Agent>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {} FROM agents WHERE created_by = $1 AND is_active \
                     ORDER BY created_at DESC, agent_id DESC",
                    AGENT_COLUMNS
                ),
                &[&owner.as_uuid()],
            )
            .await
            .map_err(storage_err)?;
        rows.iter().map(agent_from_row).collect()
    }

    async fn agent_find_conflict(
        &self,
        owner: AdminId,
        email: Option<&str>,
        mobile: Option<&str>,
        exclude: Option<AgentId>,
    ) -> RosterResult<Option<Agent>> {
        let conn = self.get_conn().await?;
        let exclude = exclude.map(|id| id.as_uuid());
        let row = conn
            .query_opt(
                &format!(
                    "SELECT {} FROM agents \
                     WHERE created_by = $1 \
                       AND ($4::uuid IS NULL OR agent_id <> $4) \
                       AND (email = $2 OR mobile = $3) \
                     LIMIT 1",
                    AGENT_COLUMNS
                ),
                &[&owner.as_uuid(), &email, &mobile, &exclude],
            )
            .await
            .map_err(storage_err)?;
        row.as_ref().map(agent_from_row).transpose()
    }

    async fn agent_update(
        &self,
        id: AgentId,
        owner: AdminId,
        update: AgentUpdate,
        now: Timestamp,
    ) -> RosterResult<Option<Agent>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                &format!(
                    "UPDATE agents SET \
                       name = COALESCE($3, name), \
                       email = COALESCE($4, email), \
                       mobile = COALESCE($5, mobile), \
                       is_active = COALESCE($6, is_active), \
                       updated_at = $7 \
                     WHERE agent_id = $1 AND created_by = $2 \
                     RETURNING {}",
                    AGENT_COLUMNS
                ),
                &[
                    &id.as_uuid(),
                    &owner.as_uuid(),
                    &update.name,
                    &update.email,
                    &update.mobile,
                    &update.is_active,
                    &now,
                ],
            )
            .await
            .map_err(storage_err)?;
        row.as_ref().map(agent_from_row).transpose()
    }

    async fn agent_delete(&self, id: AgentId, owner: AdminId) -> RosterResult<bool> {
        let conn = self.get_conn().await?;
        let removed = conn
            .execute(
                "DELETE FROM agents WHERE agent_id = $1 AND created_by = $2",
                &[&id.as_uuid(), &owner.as_uuid()],
            )
            .await
            .map_err(storage_err)?;
        Ok(removed > 0)
    }

    // ========================================================================
    // LIST OPERATIONS
    // ========================================================================

    async fn list_insert(&self, list: &ListAggregate) -> RosterResult<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            &format!(
                "INSERT INTO lists ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                LIST_COLUMNS
            ),
            &[
                &list.list_id.as_uuid(),
                &list.file_name,
                &to_i64(list.total_items, "total_items")?,
                &list.uploaded_by.as_uuid(),
                &Json(&list.distributions),
                &list.status.as_str(),
                &list.created_at,
                &list.updated_at,
            ],
        )
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn list_get(&self, id: ListId, owner: AdminId) -> RosterResult<Option<ListAggregate>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                &format!(
                    "SELECT {} FROM lists WHERE list_id = $1 AND uploaded_by = $2",
                    LIST_COLUMNS
                ),
                &[&id.as_uuid(), &owner.as_uuid()],
            )
            .await
            .map_err(storage_err)?;
        row.as_ref().map(list_from_row).transpose()
    }

    async fn list_list_by_owner(&self, owner: AdminId) -> RosterResult<Vec<ListAggregate>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {} FROM lists WHERE uploaded_by = $1 \
                     ORDER BY created_at DESC, list_id DESC",
                    LIST_COLUMNS
                ),
                &[&owner.as_uuid()],
            )
            .await
            .map_err(storage_err)?;
        rows.iter().map(list_from_row).collect()
    }

    async fn list_set_status(
        &self,
        id: ListId,
        status: ListStatus,
        now: Timestamp,
    ) -> RosterResult<()> {
        let conn = self.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE lists SET status = $2, updated_at = $3 WHERE list_id = $1",
                &[&id.as_uuid(), &status.as_str(), &now],
            )
            .await
            .map_err(storage_err)?;
        if updated == 0 {
            return Err(not_found(EntityType::List, id.as_uuid()));
        }
        Ok(())
    }

    async fn distribution_commit(
        &self,
        list_id: ListId,
        distribution: &Distribution,
        tasks: &[TaskRecord],
    ) -> RosterResult<CommitOutcome> {
        let agent_id = distribution.agent_id;
        let item_count = to_i64(distribution.item_count, "item_count")?;

        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(storage_err)?;

        let list_exists = tx
            .query_opt(
                "SELECT 1 FROM lists WHERE list_id = $1 FOR SHARE",
                &[&list_id.as_uuid()],
            )
            .await
            .map_err(storage_err)?
            .is_some();
        if !list_exists {
            return Err(not_found(EntityType::List, list_id.as_uuid()));
        }

        let recorded = tx
            .execute(
                "INSERT INTO distribution_commits (list_id, agent_id, item_count, committed_at) \
                 VALUES ($1, $2, $3, now()) ON CONFLICT (list_id, agent_id) DO NOTHING",
                &[&list_id.as_uuid(), &agent_id.as_uuid(), &item_count],
            )
            .await
            .map_err(storage_err)?;
        if recorded == 0 {
            // Dropping the transaction rolls it back.
            return Ok(CommitOutcome::AlreadyApplied);
        }

        let bumped = tx
            .execute(
                "UPDATE agents SET assigned_tasks = assigned_tasks + $2 WHERE agent_id = $1",
                &[&agent_id.as_uuid(), &item_count],
            )
            .await
            .map_err(storage_err)?;
        if bumped == 0 {
            return Err(not_found(EntityType::Agent, agent_id.as_uuid()));
        }

        let insert = tx
            .prepare(&format!(
                "INSERT INTO tasks ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
                TASK_COLUMNS
            ))
            .await
            .map_err(storage_err)?;
        for task in tasks {
            tx.execute(
                &insert,
                &[
                    &task.task_id.as_uuid(),
                    &task.first_name,
                    &task.phone,
                    &task.notes,
                    &task.assigned_to.as_uuid(),
                    &task.assigned_by.as_uuid(),
                    &task.list_id.as_uuid(),
                    &task.status.as_str(),
                    &task.completed_at,
                    &task.created_at,
                    &task.updated_at,
                ],
            )
            .await
            .map_err(storage_err)?;
        }

        tx.commit().await.map_err(|e| {
            let reason = e.to_string();
            tracing::error!(
                list_id = %list_id,
                agent_id = %agent_id,
                %reason,
                "Distribution commit failed"
            );
            RosterError::from(StorageError::TransactionFailed { reason })
        })?;
        Ok(CommitOutcome::Applied)
    }

    async fn distribution_committed(&self, list_id: ListId) -> RosterResult<Vec<AgentId>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT agent_id FROM distribution_commits WHERE list_id = $1 ORDER BY agent_id",
                &[&list_id.as_uuid()],
            )
            .await
            .map_err(storage_err)?;
        rows.iter()
            .map(|row| {
                row.try_get::<_, Uuid>("agent_id")
                    .map(AgentId::new)
                    .map_err(storage_err)
            })
            .collect()
    }

    async fn list_delete_cascade(
        &self,
        id: ListId,
        owner: AdminId,
    ) -> RosterResult<Option<DeletionReport>> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(storage_err)?;

        let owned = tx
            .query_opt(
                "SELECT 1 FROM lists WHERE list_id = $1 AND uploaded_by = $2 FOR UPDATE",
                &[&id.as_uuid(), &owner.as_uuid()],
            )
            .await
            .map_err(storage_err)?
            .is_some();
        if !owned {
            return Ok(None);
        }

        let tasks_removed = tx
            .execute("DELETE FROM tasks WHERE list_id = $1", &[&id.as_uuid()])
            .await
            .map_err(storage_err)?;

        let ledger = tx
            .query(
                "DELETE FROM distribution_commits WHERE list_id = $1 \
                 RETURNING agent_id, item_count",
                &[&id.as_uuid()],
            )
            .await
            .map_err(storage_err)?;

        let mut counters_reversed = Vec::with_capacity(ledger.len());
        for row in &ledger {
            let agent_id: Uuid = row.try_get("agent_id").map_err(storage_err)?;
            let item_count: i64 = row.try_get("item_count").map_err(storage_err)?;
            tx.execute(
                "UPDATE agents SET assigned_tasks = GREATEST(assigned_tasks - $2, 0) \
                 WHERE agent_id = $1",
                &[&agent_id, &item_count],
            )
            .await
            .map_err(storage_err)?;
            counters_reversed.push((AgentId::new(agent_id), item_count));
        }

        tx.execute("DELETE FROM lists WHERE list_id = $1", &[&id.as_uuid()])
            .await
            .map_err(storage_err)?;

        tx.commit().await.map_err(|e| {
            RosterError::from(StorageError::TransactionFailed {
                reason: e.to_string(),
            })
        })?;

        Ok(Some(DeletionReport {
            tasks_removed,
            counters_reversed,
        }))
    }

    // ========================================================================
    // TASK OPERATIONS
    // ========================================================================

    async fn task_get(&self, id: TaskId, assigned_to: AgentId) -> RosterResult<Option<TaskRecord>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                &format!(
                    "SELECT {} FROM tasks WHERE task_id = $1 AND assigned_to = $2",
                    TASK_COLUMNS
                ),
                &[&id.as_uuid(), &assigned_to.as_uuid()],
            )
            .await
            .map_err(storage_err)?;
        row.as_ref().map(task_from_row).transpose()
    }

    async fn task_list_for_agent(
        &self,
        assigned_to: AgentId,
        status: Option<TaskStatus>,
        offset: usize,
        limit: usize,
    ) -> RosterResult<Vec<TaskRecord>> {
        let conn = self.get_conn().await?;
        let status = status.map(|s| s.as_str());
        let rows = conn
            .query(
                &format!(
                    "SELECT {} FROM tasks \
                     WHERE assigned_to = $1 AND ($2::text IS NULL OR status = $2) \
                     ORDER BY created_at DESC, task_id DESC \
                     OFFSET $3 LIMIT $4",
                    TASK_COLUMNS
                ),
                &[
                    &assigned_to.as_uuid(),
                    &status,
                    &to_i64(offset, "offset")?,
                    &to_i64(limit, "limit")?,
                ],
            )
            .await
            .map_err(storage_err)?;
        rows.iter().map(task_from_row).collect()
    }

    async fn task_count_for_agent(
        &self,
        assigned_to: AgentId,
        status: Option<TaskStatus>,
    ) -> RosterResult<u64> {
        let conn = self.get_conn().await?;
        let status = status.map(|s| s.as_str());
        let row = conn
            .query_one(
                "SELECT COUNT(*) FROM tasks \
                 WHERE assigned_to = $1 AND ($2::text IS NULL OR status = $2)",
                &[&assigned_to.as_uuid(), &status],
            )
            .await
            .map_err(storage_err)?;
        let count: i64 = row.try_get(0).map_err(storage_err)?;
        u64::try_from(count).map_err(|e| decode_err("count", e))
    }

    async fn task_update_status(
        &self,
        id: TaskId,
        assigned_to: AgentId,
        status: TaskStatus,
        now: Timestamp,
    ) -> RosterResult<Option<TaskRecord>> {
        let conn = self.get_conn().await?;
        let stamp = completion_stamp(status, now);
        let row = conn
            .query_opt(
                &format!(
                    "UPDATE tasks SET \
                       status = $3, \
                       completed_at = COALESCE($4::timestamptz, completed_at), \
                       updated_at = $5 \
                     WHERE task_id = $1 AND assigned_to = $2 \
                     RETURNING {}",
                    TASK_COLUMNS
                ),
                &[
                    &id.as_uuid(),
                    &assigned_to.as_uuid(),
                    &status.as_str(),
                    &stamp,
                    &now,
                ],
            )
            .await
            .map_err(storage_err)?;
        row.as_ref().map(task_from_row).transpose()
    }

    async fn task_list_by_list(&self, list_id: ListId) -> RosterResult<Vec<TaskRecord>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {} FROM tasks WHERE list_id = $1 ORDER BY created_at, task_id",
                    TASK_COLUMNS
                ),
                &[&list_id.as_uuid()],
            )
            .await
            .map_err(storage_err)?;
        rows.iter().map(task_from_row).collect()
    }

    async fn task_stats_for_agent(&self, assigned_to: AgentId) -> RosterResult<TaskStats> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT status, COUNT(*) AS n FROM tasks WHERE assigned_to = $1 GROUP BY status",
                &[&assigned_to.as_uuid()],
            )
            .await
            .map_err(storage_err)?;

        let mut stats = TaskStats::default();
        for row in &rows {
            let status: String = row.try_get("status").map_err(storage_err)?;
            let count: i64 = row.try_get("n").map_err(storage_err)?;
            let status: TaskStatus = status.parse().map_err(|e| decode_err("status", e))?;
            stats.add(status, u64::try_from(count).map_err(|e| decode_err("n", e))?);
        }
        Ok(stats)
    }

    // ========================================================================
    // HEALTH
    // ========================================================================

    async fn health_check(&self) -> RosterResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await.map_err(storage_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DbConfig::default();
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "roster");
        assert_eq!(config.max_size, 16);
    }

    #[test]
    fn test_pool_creation_is_lazy() -> ApiResult<()> {
        // No connection is opened until the first checkout.
        let client = DbClient::from_config(&DbConfig::default())?;
        assert_eq!(client.pool_size(), 0);
        Ok(())
    }

    #[test]
    fn test_schema_declares_unique_constraints() {
        assert!(SCHEMA_SQL.contains("agents_owner_email_key"));
        assert!(SCHEMA_SQL.contains("agents_owner_mobile_key"));
        assert!(SCHEMA_SQL.contains("PRIMARY KEY (list_id, agent_id)"));
    }
}
