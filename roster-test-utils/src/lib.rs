//! Roster Test Utilities
//!
//! Shared test infrastructure for the Roster workspace:
//! - Proptest generators for rows, records and statuses
//! - Fixtures that seed a store with agents and build upload files
//! - Assertions over agent counters and error kinds

// Re-export the in-memory store from its source crate
pub use roster_storage::{InMemoryStore, RosterStore};

// Re-export core types for convenience
pub use roster_core::{
    AdminId, Agent, AgentId, CanonicalRecord, DistributionError, EntityIdType, EntityType,
    ListAggregate, ListId, ListStatus, RawRow, RosterError, RosterResult, StorageError, TaskId,
    TaskRecord, TaskStatus, Timestamp, AGENTS_PER_LIST,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    /// Headers that normalize into the name family.
    pub const NAME_HEADERS: [&str; 4] = ["FirstName", "first_name", "Name", "Full Name"];
    /// Headers that normalize into the phone family.
    pub const PHONE_HEADERS: [&str; 4] = ["Phone", "phone_number", "Mobile", "Mobile Number"];
    /// Headers that normalize into the note family.
    pub const NOTE_HEADERS: [&str; 3] = ["Notes", "note", "Comments"];

    pub fn arb_admin_id() -> impl Strategy<Value = AdminId> {
        any::<u128>().prop_map(|bits| AdminId::new(uuid::Uuid::from_u128(bits)))
    }

    pub fn arb_task_status() -> impl Strategy<Value = TaskStatus> {
        prop_oneof![
            Just(TaskStatus::Pending),
            Just(TaskStatus::InProgress),
            Just(TaskStatus::Completed),
        ]
    }

    pub fn arb_first_name() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{1,12}"
    }

    pub fn arb_phone() -> impl Strategy<Value = String> {
        "\\+1[0-9]{10}"
    }

    pub fn arb_canonical_record() -> impl Strategy<Value = CanonicalRecord> {
        (arb_first_name(), arb_phone(), "[a-z ]{0,24}").prop_map(|(first_name, phone, notes)| {
            CanonicalRecord {
                first_name,
                phone,
                notes,
            }
        })
    }

    /// A raw row with a name and a phone under randomly chosen header
    /// spellings, so it always normalizes.
    pub fn arb_valid_raw_row() -> impl Strategy<Value = RawRow> {
        (
            prop::sample::select(NAME_HEADERS.to_vec()),
            prop::sample::select(PHONE_HEADERS.to_vec()),
            prop::sample::select(NOTE_HEADERS.to_vec()),
            arb_first_name(),
            arb_phone(),
            "[a-z ]{0,24}",
        )
            .prop_map(|(nh, ph, th, name, phone, note)| {
                [(nh, name), (ph, phone), (th, note)].into_iter().collect()
            })
    }

    /// A raw row missing either its name or its phone.
    pub fn arb_invalid_raw_row() -> impl Strategy<Value = RawRow> {
        prop_oneof![
            arb_phone().prop_map(|phone| [("Phone", phone)].into_iter().collect::<RawRow>()),
            arb_first_name().prop_map(|name| [("FirstName", name)].into_iter().collect::<RawRow>()),
            Just([("FirstName", "   "), ("Phone", "")].into_iter().collect::<RawRow>()),
        ]
    }

    /// Upload sizes around the interesting boundaries of a five-way split.
    pub fn arb_row_count() -> impl Strategy<Value = usize> {
        prop_oneof![0usize..=12, 13usize..=500]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    use super::*;
    use chrono::{Duration, Utc};

    pub fn record(i: usize) -> CanonicalRecord {
        CanonicalRecord {
            first_name: format!("Contact{}", i),
            phone: format!("+1555{:07}", i),
            notes: String::new(),
        }
    }

    pub fn records(n: usize) -> Vec<CanonicalRecord> {
        (0..n).map(record).collect()
    }

    /// An active agent with unique contact details derived from `i`.
    pub fn agent(owner: AdminId, i: usize) -> Agent {
        Agent::new(
            owner,
            format!("Agent {}", i),
            format!("agent{}@roster.test", i),
            format!("+1444{:07}", i),
            Utc::now(),
        )
    }

    /// Insert `n` active agents with strictly increasing creation times and
    /// return them newest first, the order a distribution uses.
    pub async fn seed_agents(
        store: &dyn RosterStore,
        owner: AdminId,
        n: usize,
    ) -> RosterResult<Vec<Agent>> {
        let base = Utc::now() - Duration::minutes(n as i64);
        let mut agents = Vec::with_capacity(n);
        for i in 0..n {
            let mut agent = agent(owner, i);
            agent.created_at = base + Duration::seconds(i as i64);
            agent.updated_at = agent.created_at;
            store.agent_insert(&agent).await?;
            agents.push(agent);
        }
        agents.reverse();
        Ok(agents)
    }

    /// CSV bytes with a header line and `n` valid rows.
    pub fn csv_bytes(n: usize) -> Vec<u8> {
        let mut out = String::from("FirstName,Phone,Notes\n");
        for i in 0..n {
            out.push_str(&format!("Contact{},+1555{:07},note {}\n", i, i, i));
        }
        out.into_bytes()
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    use super::*;

    /// Assert each agent's stored counter, in the given order.
    pub async fn assert_counters(
        store: &dyn RosterStore,
        owner: AdminId,
        agents: &[Agent],
        expected: &[i64],
    ) {
        assert_eq!(agents.len(), expected.len(), "one expected counter per agent");
        for (agent, want) in agents.iter().zip(expected) {
            let stored = store
                .agent_get(agent.agent_id, owner)
                .await
                .expect("agent lookup")
                .expect("agent exists");
            assert_eq!(
                stored.assigned_tasks, *want,
                "assigned_tasks of {}",
                agent.name
            );
        }
    }

    pub fn assert_not_found<T: std::fmt::Debug>(result: &RosterResult<T>, entity_type: EntityType) {
        match result {
            Err(RosterError::Storage(StorageError::NotFound { entity_type: et, .. })) => {
                assert_eq!(*et, entity_type, "wrong entity type in NotFound");
            }
            other => panic!("Expected NotFound({:?}), got {:?}", entity_type, other),
        }
    }

    pub fn assert_unique_violation<T: std::fmt::Debug>(result: &RosterResult<T>) {
        assert!(
            matches!(result, Err(RosterError::Storage(StorageError::UniqueViolation { .. }))),
            "Expected UniqueViolation, got {:?}",
            result
        );
    }
}
