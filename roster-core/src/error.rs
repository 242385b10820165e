//! Error types for Roster operations

use crate::EntityType;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Unique constraint {constraint} violated")]
    UniqueViolation { constraint: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Database error: {reason}")]
    Database { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },
}

/// Errors raised while partitioning an upload across agents.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DistributionError {
    #[error("Need at least {required} active agents. Found: {found}")]
    InsufficientAgents { required: usize, found: usize },

    #[error("No valid data found in file")]
    NoValidData,
}

/// Errors raised while turning an uploaded file into raw rows.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("Unsupported file type: {extension:?} (expected .csv, .xlsx or .xls)")]
    UnsupportedExtension { extension: String },

    #[error("Malformed file: {reason}")]
    Malformed { reason: String },

    #[error("I/O error reading upload: {reason}")]
    Io { reason: String },
}

/// Master error type for all Roster errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),
}

/// Result type alias for Roster operations.
pub type RosterResult<T> = Result<T, RosterError>;

// =============================================================================
// TESTS
// =============================================================================
