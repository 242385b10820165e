//! Service Layer
//!
//! Business logic between the HTTP handlers and the store. Handlers parse
//! and authorize; services validate, orchestrate multi-step writes and log.
//! Every function takes the store as `&dyn RosterStore` so it runs unchanged
//! on either backend.

mod agent_service;
mod list_service;
mod task_service;
mod upload_service;

pub use agent_service::*;
pub use list_service::*;
pub use task_service::*;
pub use upload_service::*;
