//! Roster Storage - Storage Trait and In-Memory Implementation
//!
//! Defines the storage abstraction for Roster entities. The Postgres
//! implementation lives in roster-api.

pub mod memory;
pub mod store;

pub use memory::InMemoryStore;
pub use store::RosterStore;

use roster_core::AgentId;
use serde::Serialize;

// ============================================================================
// UPDATE TYPES
// ============================================================================

/// Update payload for agents. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub is_active: Option<bool>,
}

impl AgentUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.mobile.is_none()
            && self.is_active.is_none()
    }
}

// ============================================================================
// COMPOUND OPERATION RESULTS
// ============================================================================

/// Result of committing one distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitOutcome {
    /// Tasks were inserted and the counter incremented.
    Applied,
    /// The `(list, agent)` pair was already in the ledger; nothing changed.
    AlreadyApplied,
}

/// What a cascading list deletion undid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub tasks_removed: u64,
    /// Counter decrements applied, one per committed distribution.
    pub counters_reversed: Vec<(AgentId, i64)>,
}
