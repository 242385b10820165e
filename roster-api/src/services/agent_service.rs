//! Agent Service
//!
//! Validation and uniqueness checks for agent CRUD. The store enforces the
//! same uniqueness rule, so a race between the check and the insert still
//! ends in a 409.

use roster_core::{AdminId, Agent, AgentId, Timestamp};
use roster_storage::{AgentUpdate, RosterStore};

use crate::error::{ApiError, ApiResult};
use crate::types::{CreateAgentRequest, UpdateAgentRequest};
use crate::validation::{validate_email, validate_mobile, validate_name};

fn agent_not_found(id: AgentId) -> ApiError {
    ApiError::entity_not_found("Agent", id)
}

async fn ensure_unique(
    store: &dyn RosterStore,
    owner: AdminId,
    email: Option<&str>,
    mobile: Option<&str>,
    exclude: Option<AgentId>,
) -> ApiResult<()> {
    if email.is_none() && mobile.is_none() {
        return Ok(());
    }
    if let Some(existing) = store.agent_find_conflict(owner, email, mobile, exclude).await? {
        let field = if email.is_some_and(|e| e == existing.email) {
            "email"
        } else {
            "mobile"
        };
        return Err(
            ApiError::conflict(format!("Agent with this {} already exists", field))
                .with_details(serde_json::json!({ "field": field })),
        );
    }
    Ok(())
}

/// Validate and insert a new agent owned by `owner`.
pub async fn create_agent(
    store: &dyn RosterStore,
    owner: AdminId,
    req: CreateAgentRequest,
    now: Timestamp,
) -> ApiResult<Agent> {
    let name = validate_name(&req.name)?;
    let email = validate_email(&req.email)?;
    let mobile = validate_mobile(&req.mobile)?;

    ensure_unique(store, owner, Some(&email), Some(&mobile), None).await?;

    let mut agent = Agent::new(owner, name, email, mobile, now);
    if let Some(is_active) = req.is_active {
        agent.is_active = is_active;
    }
    store.agent_insert(&agent).await?;

    tracing::info!(agent_id = %agent.agent_id, admin_id = %owner, "Agent created");
    Ok(agent)
}

pub async fn list_agents(store: &dyn RosterStore, owner: AdminId) -> ApiResult<Vec<Agent>> {
    Ok(store.agent_list_by_owner(owner).await?)
}

pub async fn get_agent(store: &dyn RosterStore, owner: AdminId, id: AgentId) -> ApiResult<Agent> {
    store
        .agent_get(id, owner)
        .await?
        .ok_or_else(|| agent_not_found(id))
}

/// Apply a partial update. An empty request returns the agent unchanged.
pub async fn update_agent(
    store: &dyn RosterStore,
    owner: AdminId,
    id: AgentId,
    req: UpdateAgentRequest,
    now: Timestamp,
) -> ApiResult<Agent> {
    let update = AgentUpdate {
        name: req.name.as_deref().map(validate_name).transpose()?,
        email: req.email.as_deref().map(validate_email).transpose()?,
        mobile: req.mobile.as_deref().map(validate_mobile).transpose()?,
        is_active: req.is_active,
    };

    if update.is_empty() {
        return get_agent(store, owner, id).await;
    }

    // Unknown ids must answer 404 even when the new values collide.
    get_agent(store, owner, id).await?;
    ensure_unique(
        store,
        owner,
        update.email.as_deref(),
        update.mobile.as_deref(),
        Some(id),
    )
    .await?;

    let agent = store
        .agent_update(id, owner, update, now)
        .await?
        .ok_or_else(|| agent_not_found(id))?;

    tracing::info!(agent_id = %id, admin_id = %owner, "Agent updated");
    Ok(agent)
}

/// Remove an agent. Its tasks stay in place.
pub async fn delete_agent(store: &dyn RosterStore, owner: AdminId, id: AgentId) -> ApiResult<()> {
    if !store.agent_delete(id, owner).await? {
        return Err(agent_not_found(id));
    }
    tracing::info!(agent_id = %id, admin_id = %owner, "Agent deleted");
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::Utc;
    use roster_core::EntityIdType;
    use roster_storage::InMemoryStore;

    fn request(name: &str, email: &str, mobile: &str) -> CreateAgentRequest {
        CreateAgentRequest {
            name: name.to_string(),
            email: email.to_string(),
            mobile: mobile.to_string(),
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_fields() -> ApiResult<()> {
        let store = InMemoryStore::new();
        let admin = AdminId::now_v7();
        let agent = create_agent(
            &store,
            admin,
            request("  Ada Lovelace ", "ADA@Example.com", "+15550100"),
            Utc::now(),
        )
        .await?;

        assert_eq!(agent.name, "Ada Lovelace");
        assert_eq!(agent.email, "ada@example.com");
        assert!(agent.is_active);
        assert_eq!(agent.assigned_tasks, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict_per_owner() -> ApiResult<()> {
        let store = InMemoryStore::new();
        let admin = AdminId::now_v7();
        create_agent(&store, admin, request("Ada", "ada@example.com", "+15550100"), Utc::now())
            .await?;

        let bob = request("Bob", "Ada@example.com", "+15550101");
        let err = create_agent(&store, admin, bob, Utc::now()).await.err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::Conflict));

        // Another admin may reuse the same contact details.
        let other = AdminId::now_v7();
        create_agent(&store, other, request("Ada", "ada@example.com", "+15550100"), Utc::now())
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_update_checks_conflicts_excluding_self() -> ApiResult<()> {
        let store = InMemoryStore::new();
        let admin = AdminId::now_v7();
        let ada =
            create_agent(&store, admin, request("Ada", "ada@example.com", "+15550100"), Utc::now())
                .await?;
        create_agent(&store, admin, request("Bob", "bob@example.com", "+15550101"), Utc::now())
            .await?;

        let same = UpdateAgentRequest {
            email: Some("ada@example.com".to_string()),
            ..Default::default()
        };
        assert!(update_agent(&store, admin, ada.agent_id, same, Utc::now()).await.is_ok());

        let taken = UpdateAgentRequest {
            mobile: Some("+15550101".to_string()),
            ..Default::default()
        };
        let err = update_agent(&store, admin, ada.agent_id, taken, Utc::now()).await.err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::Conflict));
        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_agent_is_not_found() -> ApiResult<()> {
        let store = InMemoryStore::new();
        let owner = AdminId::now_v7();
        let agent =
            create_agent(&store, owner, request("Ada", "ada@example.com", "+15550100"), Utc::now())
                .await?;

        let stranger = AdminId::now_v7();
        let err = get_agent(&store, stranger, agent.agent_id).await.err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::EntityNotFound));

        let err = delete_agent(&store, stranger, agent.agent_id).await.err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::EntityNotFound));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_update_field_is_rejected() {
        let store = InMemoryStore::new();
        let req = UpdateAgentRequest {
            name: Some("x".to_string()),
            ..Default::default()
        };
        let err = update_agent(&store, AdminId::now_v7(), AgentId::now_v7(), req, Utc::now())
            .await
            .err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::ValidationFailed));
    }
}
