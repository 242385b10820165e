//! Agent-related API types

use roster_core::Agent;
use serde::{Deserialize, Serialize};

/// Request to create a new agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateAgentRequest {
    /// Display name, 2 to 50 characters after trimming
    pub name: String,
    /// Unique per admin; stored lower-cased
    pub email: String,
    /// Mobile number with country code, e.g. `+15550100`
    pub mobile: String,
    /// Defaults to true
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Request to update an agent. Absent fields are left unchanged.
///
/// `assigned_tasks` is not accepted here; it only moves through uploads and
/// list deletions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateAgentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// A single agent with a status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentEnvelope {
    pub message: String,
    pub agent: Agent,
}

impl AgentEnvelope {
    pub fn new(message: impl Into<String>, agent: Agent) -> Self {
        Self {
            message: message.into(),
            agent,
        }
    }
}

/// Response containing a list of agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListAgentsResponse {
    pub message: String,
    pub agents: Vec<Agent>,
    pub count: usize,
}

impl ListAgentsResponse {
    pub fn new(agents: Vec<Agent>) -> Self {
        Self {
            message: "Agents retrieved successfully".to_string(),
            count: agents.len(),
            agents,
        }
    }
}
