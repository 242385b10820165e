//! Upload Service
//!
//! Turns an uploaded file into a distributed list:
//!
//! 1. resolve the format from the file name (unsupported types never reach a parser)
//! 2. stage the bytes in a temp file and parse them on the blocking pool
//! 3. normalize rows and split them across the first five active agents
//! 4. persist the list, then commit each distribution through the store
//!
//! Commits are atomic and idempotent per `(list, agent)`. When one fails the
//! earlier ones stay, the list is marked `failed`, and [`resume_upload`]
//! applies whatever is still missing.

use std::io::Write;
use std::time::Instant;

use roster_core::{
    distribute, normalize_rows, AdminId, DistributionError, IngestError, ListAggregate, ListId,
    ListStatus, RawRow, RosterResult, Timestamp,
};
use roster_ingest::FileFormat;
use roster_storage::{CommitOutcome, RosterStore};

use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics;

/// Write `bytes` to a scoped temp file and parse it.
///
/// The temp file is removed when the guard drops, on success and on error.
pub fn parse_staged(format: FileFormat, bytes: &[u8]) -> Result<Vec<RawRow>, IngestError> {
    let io_err = |e: std::io::Error| IngestError::Io {
        reason: e.to_string(),
    };

    let mut staged = tempfile::Builder::new()
        .prefix("roster-upload-")
        .suffix(&format!(".{}", format.extension()))
        .tempfile()
        .map_err(io_err)?;
    staged.write_all(bytes).map_err(io_err)?;
    staged.flush().map_err(io_err)?;

    format.parser().parse(staged.path())
}

async fn parse_upload(format: FileFormat, bytes: Vec<u8>) -> ApiResult<Vec<RawRow>> {
    tokio::task::spawn_blocking(move || parse_staged(format, &bytes))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Upload parser task failed");
            ApiError::internal_error("Failed to process uploaded file")
        })?
        .map_err(ApiError::from)
}

/// Commit every distribution of `list` that is not yet in the ledger.
/// Returns how many were applied by this call.
pub async fn commit_distributions(
    store: &dyn RosterStore,
    list: &ListAggregate,
    now: Timestamp,
) -> RosterResult<usize> {
    let mut applied = 0;
    for distribution in &list.distributions {
        let tasks = distribution.to_tasks(list.list_id, list.uploaded_by, now);
        match store
            .distribution_commit(list.list_id, distribution, &tasks)
            .await?
        {
            CommitOutcome::Applied => {
                applied += 1;
                tracing::debug!(
                    list_id = %list.list_id,
                    agent_id = %distribution.agent_id,
                    item_count = distribution.item_count,
                    "Distribution committed"
                );
            }
            CommitOutcome::AlreadyApplied => {}
        }
    }
    Ok(applied)
}

async fn mark_failed(store: &dyn RosterStore, list_id: ListId, now: Timestamp) {
    if let Err(e) = store.list_set_status(list_id, ListStatus::Failed, now).await {
        tracing::error!(%list_id, error = %e, "Failed to mark list as failed");
    }
}

fn record_outcome(outcome: &str, format: Option<FileFormat>, rows: usize, started: Instant) {
    let format = format.map_or("unknown", |f| f.extension());
    metrics::record(|m| m.record_upload(outcome, format, rows, started.elapsed().as_secs_f64()));
}

/// Parse, distribute and persist an upload for `owner`.
pub async fn upload_list(
    store: &dyn RosterStore,
    owner: AdminId,
    file_name: &str,
    bytes: Vec<u8>,
    now: Timestamp,
) -> ApiResult<ListAggregate> {
    let started = Instant::now();

    let format = match FileFormat::from_file_name(file_name) {
        Ok(format) => format,
        Err(e) => {
            record_outcome("rejected", None, 0, started);
            return Err(e.into());
        }
    };

    let result = distribute_upload(store, owner, file_name, format, bytes, now).await;
    match &result {
        Ok(list) => record_outcome("completed", Some(format), list.total_items, started),
        Err(e) if e.status_code().is_client_error() => {
            record_outcome("rejected", Some(format), 0, started)
        }
        Err(_) => record_outcome("failed", Some(format), 0, started),
    }
    result
}

async fn distribute_upload(
    store: &dyn RosterStore,
    owner: AdminId,
    file_name: &str,
    format: FileFormat,
    bytes: Vec<u8>,
    now: Timestamp,
) -> ApiResult<ListAggregate> {
    let rows = parse_upload(format, bytes).await?;
    let records = normalize_rows(&rows);
    tracing::debug!(
        file_name,
        rows = rows.len(),
        records = records.len(),
        "Upload normalized"
    );
    if records.is_empty() {
        return Err(DistributionError::NoValidData.into());
    }

    let agents = store.agent_list_active(owner).await?;
    let distributions = distribute(records, &agents)?;

    let list = ListAggregate::new(file_name, owner, distributions, ListStatus::Completed, now);
    list.check_invariants()?;
    store.list_insert(&list).await?;

    if let Err(e) = commit_distributions(store, &list, now).await {
        tracing::error!(
            list_id = %list.list_id,
            admin_id = %owner,
            error = %e,
            "Distribution commit failed; list marked failed"
        );
        mark_failed(store, list.list_id, now).await;
        return Err(ApiError::internal_error(
            "Upload was stored but could not be fully distributed; resume it to finish",
        )
        .with_details(serde_json::json!({ "list_id": list.list_id })));
    }

    tracing::info!(
        list_id = %list.list_id,
        admin_id = %owner,
        total_items = list.total_items,
        "File uploaded and distributed"
    );
    Ok(list)
}

/// A pending distribution whose agent was deleted can never commit, so the
/// resume is rejected up front and the list keeps its status.
async fn ensure_pending_agents_exist(
    store: &dyn RosterStore,
    owner: AdminId,
    list: &ListAggregate,
) -> ApiResult<()> {
    let committed = store.distribution_committed(list.list_id).await?;
    for distribution in &list.distributions {
        if committed.contains(&distribution.agent_id) {
            continue;
        }
        if store.agent_get(distribution.agent_id, owner).await?.is_none() {
            tracing::warn!(
                list_id = %list.list_id,
                agent_id = %distribution.agent_id,
                "Resume rejected; assigned agent no longer exists"
            );
            return Err(ApiError::validation_failed(format!(
                "Agent {} of this list no longer exists; delete the list and upload it again",
                distribution.agent_id
            ))
            .with_details(serde_json::json!({
                "list_id": list.list_id,
                "agent_id": distribution.agent_id,
            })));
        }
    }
    Ok(())
}

/// Apply the commits a failed upload is missing and mark it `completed`.
///
/// Safe to call on a list that is already complete; nothing is applied twice.
pub async fn resume_upload(
    store: &dyn RosterStore,
    owner: AdminId,
    id: ListId,
    now: Timestamp,
) -> ApiResult<(ListAggregate, usize)> {
    let mut list = store
        .list_get(id, owner)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("List", id))?;
    ensure_pending_agents_exist(store, owner, &list).await?;

    let applied = match commit_distributions(store, &list, now).await {
        Ok(applied) => applied,
        Err(e) => {
            tracing::error!(list_id = %id, error = %e, "Resume failed");
            mark_failed(store, id, now).await;
            return Err(ApiError::internal_error(
                "Upload could not be fully distributed; resume it again",
            )
            .with_details(serde_json::json!({ "list_id": id })));
        }
    };

    if list.status != ListStatus::Completed {
        store.list_set_status(id, ListStatus::Completed, now).await?;
        list.status = ListStatus::Completed;
        list.updated_at = now;
    }

    tracing::info!(list_id = %id, commits_applied = applied, "Upload resumed");
    Ok((list, applied))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::Utc;
    use roster_core::{Agent, EntityIdType};
    use roster_storage::InMemoryStore;

    async fn seed_agents(store: &InMemoryStore, owner: AdminId, n: usize) -> Vec<Agent> {
        let mut agents = Vec::new();
        for i in 0..n {
            let agent = Agent::new(
                owner,
                format!("Agent {}", i),
                format!("agent{}@example.com", i),
                format!("+1555010{}", i),
                Utc::now(),
            );
            store.agent_insert(&agent).await.expect("insert agent");
            agents.push(agent);
        }
        agents
    }

    fn csv_bytes(rows: usize) -> Vec<u8> {
        let mut body = String::from("FirstName,Phone,Notes\n");
        for i in 0..rows {
            body.push_str(&format!("Person {},+1999000{:04},note {}\n", i, i, i));
        }
        body.into_bytes()
    }

    fn xlsx_bytes(rows: usize) -> Vec<u8> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (c, header) in ["FirstName", "Phone", "Notes"].into_iter().enumerate() {
            sheet.write_string(0, c as u16, header).expect("header");
        }
        for i in 0..rows {
            let r = i as u32 + 1;
            sheet.write_string(r, 0, format!("Person {}", i)).expect("name");
            sheet.write_string(r, 1, format!("+1999000{:04}", i)).expect("phone");
            sheet.write_string(r, 2, format!("note {}", i)).expect("note");
        }
        workbook.save_to_buffer().expect("workbook bytes")
    }

    #[test]
    fn test_parse_staged_reads_csv() {
        let rows = parse_staged(FileFormat::Csv, b"Name,Phone\nAda,+1555\n").expect("parse");
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_twelve_rows_splits_three_three_two_two_two() -> ApiResult<()> {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        seed_agents(&store, owner, 5).await;

        let list = upload_list(&store, owner, "leads.csv", csv_bytes(12), Utc::now()).await?;
        let counts: Vec<usize> = list.distributions.iter().map(|d| d.item_count).collect();
        assert_eq!(counts, vec![3, 3, 2, 2, 2]);
        assert_eq!(list.status, ListStatus::Completed);
        assert_eq!(store.task_count()?, 12);
        Ok(())
    }

    #[tokio::test]
    async fn test_xlsx_upload_matches_csv_upload() -> ApiResult<()> {
        let from_xlsx = parse_staged(FileFormat::Xlsx, &xlsx_bytes(7)).expect("parse xlsx");
        let from_csv = parse_staged(FileFormat::Csv, &csv_bytes(7)).expect("parse csv");
        assert_eq!(normalize_rows(&from_xlsx), normalize_rows(&from_csv));

        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        seed_agents(&store, owner, 5).await;

        let list = upload_list(&store, owner, "Leads.XLSX", xlsx_bytes(7), Utc::now()).await?;
        let counts: Vec<usize> = list.distributions.iter().map(|d| d.item_count).collect();
        assert_eq!(counts, vec![2, 2, 1, 1, 1]);
        assert_eq!(list.distributions[0].items[0].first_name, "Person 0");
        assert_eq!(list.distributions[0].items[0].phone, "+19990000000");
        assert_eq!(store.task_count()?, 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_rejected_before_parsing() {
        let store = InMemoryStore::new();
        let err = upload_list(&store, AdminId::now_v7(), "leads.pdf", vec![1, 2, 3], Utc::now())
            .await
            .err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::UnsupportedFile));
    }

    #[tokio::test]
    async fn test_file_without_valid_rows_is_no_valid_data() -> ApiResult<()> {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        seed_agents(&store, owner, 5).await;

        let body = b"Company,City\nAcme,Paris\n".to_vec();
        let err = upload_list(&store, owner, "x.csv", body, Utc::now()).await.err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::NoValidData));
        assert_eq!(store.list_count()?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_too_few_agents_writes_nothing() -> ApiResult<()> {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        seed_agents(&store, owner, 4).await;

        let err = upload_list(&store, owner, "x.csv", csv_bytes(3), Utc::now()).await.err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::InsufficientAgents));
        assert_eq!(store.list_count()?, 0);
        assert_eq!(store.task_count()?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_commit_marks_list_failed_and_resume_completes() -> ApiResult<()> {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        let agents = seed_agents(&store, owner, 5).await;
        // Newest first: the third selected agent is agents[2].
        store.fail_commits_for(agents[2].agent_id)?;

        let err = upload_list(&store, owner, "x.csv", csv_bytes(10), Utc::now())
            .await
            .err()
            .expect("commit failure");
        assert_eq!(err.code, ErrorCode::InternalError);

        let lists = store.list_list_by_owner(owner).await?;
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].status, ListStatus::Failed);
        assert_eq!(store.distribution_committed(lists[0].list_id).await?.len(), 2);

        store.clear_commit_failures()?;
        let (list, applied) = resume_upload(&store, owner, lists[0].list_id, Utc::now()).await?;
        assert_eq!(applied, 3);
        assert_eq!(list.status, ListStatus::Completed);
        assert_eq!(store.task_count()?, 10);

        for agent in &agents {
            let stored = store.agent_get(agent.agent_id, owner).await?.expect("agent");
            assert_eq!(stored.assigned_tasks, 2);
        }

        let (_, again) = resume_upload(&store, owner, list.list_id, Utc::now()).await?;
        assert_eq!(again, 0);
        assert_eq!(store.task_count()?, 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_resume_with_deleted_agent_names_the_agent() -> ApiResult<()> {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        let agents = seed_agents(&store, owner, 5).await;
        let missing = agents[2].agent_id;
        store.fail_commits_for(missing)?;

        upload_list(&store, owner, "x.csv", csv_bytes(10), Utc::now())
            .await
            .err()
            .expect("commit failure");
        let list_id = store.list_list_by_owner(owner).await?[0].list_id;

        store.clear_commit_failures()?;
        assert!(store.agent_delete(missing, owner).await?);

        for _ in 0..2 {
            let err = resume_upload(&store, owner, list_id, Utc::now())
                .await
                .err()
                .expect("resume rejected");
            assert_eq!(err.code, ErrorCode::ValidationFailed);
            assert!(err.message.contains(&missing.to_string()));
            assert_eq!(
                err.details,
                Some(serde_json::json!({ "list_id": list_id, "agent_id": missing }))
            );
        }

        let list = store.list_get(list_id, owner).await?.expect("list kept");
        assert_eq!(list.status, ListStatus::Failed);
        assert_eq!(store.distribution_committed(list_id).await?.len(), 2);
        Ok(())
    }
}
