//! Property tests over the upload, task and delete services, run against the
//! in-memory store.

use chrono::Utc;
use proptest::prelude::*;
use roster_api::{services, ErrorCode};
use roster_core::{
    CanonicalRecord, Distribution, EntityIdType, EntityType, ListAggregate, ListStatus, Pagination,
    TaskStatus,
};
use roster_storage::{InMemoryStore, RosterStore};
use roster_test_utils::{
    assertions::{assert_counters, assert_not_found},
    fixtures,
    generators::{arb_admin_id, arb_canonical_record, arb_row_count, arb_task_status},
    AdminId,
};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

fn csv_from(records: &[CanonicalRecord]) -> Vec<u8> {
    let mut out = String::from("First Name,Mobile,Notes\n");
    for record in records {
        out.push_str(&format!(
            "{},{},{}\n",
            record.first_name, record.phone, record.notes
        ));
    }
    out.into_bytes()
}

/// Cells are trimmed on the way in, so a note of only spaces comes back empty.
fn as_uploaded(records: &[CanonicalRecord]) -> Vec<CanonicalRecord> {
    records
        .iter()
        .map(|r| CanonicalRecord {
            notes: r.notes.trim().to_string(),
            ..r.clone()
        })
        .collect()
}

fn arb_records() -> impl Strategy<Value = Vec<CanonicalRecord>> {
    arb_row_count().prop_flat_map(|n| proptest::collection::vec(arb_canonical_record(), n))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every uploaded row lands with exactly one agent in file order, and
    /// deleting the list hands every counter back.
    #[test]
    fn prop_upload_then_delete_restores_counters(
        owner in arb_admin_id(),
        records in arb_records(),
    ) {
        runtime().block_on(async {
            let store = InMemoryStore::new();
            let agents = fixtures::seed_agents(&store, owner, 5).await.expect("seed");
            let bytes = csv_from(&records);

            let result = services::upload_list(&store, owner, "leads.csv", bytes, Utc::now()).await;
            if records.is_empty() {
                let code = result.err().map(|e| e.code);
                prop_assert_eq!(code, Some(ErrorCode::NoValidData));
                prop_assert_eq!(store.list_count().expect("count"), 0);
                return Ok(());
            }
            let list = result.expect("upload");

            let delivered: Vec<CanonicalRecord> = list
                .distributions
                .iter()
                .flat_map(|d| d.items.iter().cloned())
                .collect();
            prop_assert_eq!(delivered, as_uploaded(&records));
            let counts: Vec<i64> = list
                .distributions
                .iter()
                .map(|d| d.item_count as i64)
                .collect();
            assert_counters(&store, owner, &agents, &counts).await;
            prop_assert_eq!(store.task_count().expect("count"), records.len());

            services::delete_upload(&store, owner, list.list_id).await.expect("delete");
            assert_counters(&store, owner, &agents, &[0; 5]).await;
            prop_assert_eq!(store.task_count().expect("count"), 0);
            prop_assert!(store.list_get(list.list_id, owner).await.expect("get").is_none());
            Ok(())
        })?;
    }

    /// Stats always add up to the agent's task count, whatever statuses the
    /// agent sets.
    #[test]
    fn prop_task_stats_total_matches_tasks(
        rows in 5usize..60,
        statuses in proptest::collection::vec(arb_task_status(), 0..16),
    ) {
        runtime().block_on(async {
            let store = InMemoryStore::new();
            let owner = AdminId::now_v7();
            let agents = fixtures::seed_agents(&store, owner, 5).await.expect("seed");
            let bytes = fixtures::csv_bytes(rows);
            let list = services::upload_list(&store, owner, "leads.csv", bytes, Utc::now())
                .await
                .expect("upload");
            let agent = agents[0].agent_id;
            let assigned = list.distributions[0].item_count;

            let paging = Pagination::from_query(Some(1), Some(100));
            let (tasks, _) = services::list_my_tasks(&store, agent, None, paging)
                .await
                .expect("tasks");
            for (task, status) in tasks.iter().zip(&statuses) {
                services::update_task_status(&store, agent, task.task_id, *status, Utc::now())
                    .await
                    .expect("update");
            }

            let stats = services::task_stats(&store, agent).await.expect("stats");
            prop_assert_eq!(stats.total, assigned as u64);
            prop_assert_eq!(stats.pending + stats.in_progress + stats.completed, stats.total);

            let applied = statuses.len().min(assigned);
            let completed = statuses[..applied]
                .iter()
                .filter(|s| **s == TaskStatus::Completed)
                .count();
            prop_assert_eq!(stats.completed, completed as u64);

            let (_, info) = services::list_my_tasks(
                &store,
                agent,
                Some(TaskStatus::InProgress),
                Pagination::from_query(None, None),
            )
            .await
            .expect("filtered tasks");
            prop_assert_eq!(info.total, stats.in_progress);
            Ok(())
        })?;
    }
}

#[tokio::test]
async fn test_commit_for_deleted_agent_is_not_found() {
    let store = InMemoryStore::new();
    let owner = AdminId::now_v7();
    let agents = fixtures::seed_agents(&store, owner, 5)
        .await
        .expect("seed");
    let gone = agents[0].agent_id;
    assert!(store.agent_delete(gone, owner).await.expect("delete"));

    let distribution = Distribution::new(gone, fixtures::records(2));
    let list = ListAggregate::new(
        "orphan.csv",
        owner,
        vec![distribution.clone()],
        ListStatus::Failed,
        Utc::now(),
    );
    store.list_insert(&list).await.expect("insert list");

    let tasks = distribution.to_tasks(list.list_id, owner, Utc::now());
    let result = store
        .distribution_commit(list.list_id, &distribution, &tasks)
        .await;
    assert_not_found(&result, EntityType::Agent);
    assert_eq!(store.task_count().expect("count"), 0);
}
