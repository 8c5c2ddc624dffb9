//! Error taxonomy for configuration and template operations.
//!
//! Every variant is recoverable at the call site: a failed operation leaves
//! the stored tenant record untouched.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Tenant configuration or template id absent
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Tenant {0} is already initialized")]
    AlreadyInitialized(String),

    #[error("Tenant {0} has no draft to publish")]
    NoDraftToPublish(String),

    #[error("Tenant {0} has no draft to discard")]
    NoDraftToDiscard(String),

    /// Uninitialize is blocked until the tenant's map list is empty
    #[error("Tenant {tenant_id} still has {count} configured map(s)")]
    MapsStillConfigured { tenant_id: String, count: usize },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The caller's snapshot is stale; refresh and retry
    #[error("Version conflict: expected {expected}, found {actual}")]
    Conflict { expected: u64, actual: u64 },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Store write rejected or timed out; not retried automatically
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        ConfigError::ValidationFailed(message.into())
    }

    /// Stable machine-readable code, used by the HTTP layer and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "NOT_FOUND",
            ConfigError::AlreadyInitialized(_) => "ALREADY_INITIALIZED",
            ConfigError::NoDraftToPublish(_) => "NO_DRAFT_TO_PUBLISH",
            ConfigError::NoDraftToDiscard(_) => "NO_DRAFT_TO_DISCARD",
            ConfigError::MapsStillConfigured { .. } => "MAPS_STILL_CONFIGURED",
            ConfigError::ValidationFailed(_) => "VALIDATION_FAILED",
            ConfigError::Conflict { .. } => "VERSION_CONFLICT",
            ConfigError::PermissionDenied(_) => "PERMISSION_DENIED",
            ConfigError::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
        }
    }
}

impl From<StoreError> for ConfigError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict {
                expected, actual, ..
            } => ConfigError::Conflict { expected, actual },
            other => ConfigError::PersistenceFailure(other.to_string()),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
