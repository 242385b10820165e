//! API Request and Response Types
//!
//! Response envelopes carry a human-readable `message` next to the payload.

// Agent types
mod agent;
pub use agent::*;

// List types
mod list;
pub use list::*;

// Task types
mod task;
pub use task::*;

use serde::{Deserialize, Serialize};

/// Bare acknowledgement, used by deletions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
