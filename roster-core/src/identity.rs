//! Identity types for Roster entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Common behaviour for strongly-typed entity identifiers.
///
/// Every identifier wraps a UUIDv7, so ids sort by creation time.
pub trait EntityIdType: Copy + Eq + std::hash::Hash + fmt::Display + fmt::Debug {
    /// Wrap an existing UUID.
    fn new(uuid: Uuid) -> Self;

    /// Borrow the inner UUID.
    fn as_uuid(&self) -> Uuid;

    /// Generate a fresh timestamp-sortable identifier.
    fn now_v7() -> Self {
        Self::new(Uuid::now_v7())
    }

    /// The all-zero identifier.
    fn nil() -> Self {
        Self::new(Uuid::nil())
    }
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_entity_id!(
    /// Identifier of an admin principal (issued by the external auth service).
    AdminId
);
define_entity_id!(
    /// Identifier of an agent. Agents are also principals with role `agent`.
    AgentId
);
define_entity_id!(
    /// Identifier of an uploaded list.
    ListId
);
define_entity_id!(
    /// Identifier of a single task.
    TaskId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_sort_by_creation() {
        let first = TaskId::now_v7();
        let second = TaskId::now_v7();
        assert!(first <= second);
    }

    #[test]
    fn test_id_parse_and_display() {
        let id = AgentId::now_v7();
        let parsed: AgentId = id.to_string().parse().expect("parse");
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<AgentId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_plain_uuid() -> Result<(), serde_json::Error> {
        let id = ListId::nil();
        let json = serde_json::to_string(&id)?;
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
        Ok(())
    }
}
