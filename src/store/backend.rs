//! Backend trait for document storage.
//!
//! A document is a flat map of named top-level fields plus a version counter
//! maintained by the store. Writes name the fields they touch; every other
//! field of the document is left as it is.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::redis::PoolError;

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Precondition version did not match the stored version
    #[error("Version conflict on {key}: expected {expected}, found {actual}")]
    Conflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    /// Redis operation failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Redis pool could not provide a connection
    #[error("Redis pool error: {0}")]
    Pool(#[from] PoolError),

    /// PostgreSQL operation failed
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data does not have the expected shape
    #[error("Corrupt document {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Backend is temporarily unavailable
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Which storage implementation backs a [`DocumentStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Redis,
    Postgres,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Redis => "redis",
            StoreBackend::Postgres => "postgres",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot of one stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document key, e.g. `tenants/springfield`
    pub key: String,

    /// Top-level fields
    pub fields: Map<String, Value>,

    /// Incremented by every successful write; 0 for a never-written document
    pub version: u64,
}

impl Document {
    /// An empty, never-written document.
    pub fn empty(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: Map::new(),
            version: 0,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// Apply field updates in order.
    pub(crate) fn apply(&mut self, updates: &[FieldUpdate]) {
        for update in updates {
            match &update.value {
                Some(value) => {
                    self.fields.insert(update.field.clone(), value.clone());
                }
                None => {
                    self.fields.remove(&update.field);
                }
            }
        }
    }
}

/// A write to a single top-level field. `None` removes the field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub field: String,
    pub value: Option<Value>,
}

impl FieldUpdate {
    pub fn set(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value: Some(value),
        }
    }

    pub fn remove(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: None,
        }
    }
}

/// Condition a write must satisfy to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Last write wins
    Any,
    /// Stored version must equal this value (0 = document not yet written)
    Version(u64),
}

impl Precondition {
    /// Check the condition against the currently stored version.
    pub fn check(&self, key: &str, actual: u64) -> Result<(), StoreError> {
        match *self {
            Precondition::Version(expected) if expected != actual => Err(StoreError::Conflict {
                key: key.to_string(),
                expected,
                actual,
            }),
            _ => Ok(()),
        }
    }
}

/// Backend trait for document storage.
///
/// Implementations must apply all updates of one `update_fields` call
/// atomically: a concurrent reader sees either none or all of them. This is
/// what lets a publish promote the draft and clear it in one step.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get the backend type.
    fn backend_type(&self) -> StoreBackend;

    /// Read a document. Returns `None` if the document was never written.
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError>;

    /// Apply field updates to a document, creating it if needed.
    ///
    /// Returns the document as stored after the write.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if `precondition` does not hold.
    async fn update_fields(
        &self,
        key: &str,
        updates: Vec<FieldUpdate>,
        precondition: Precondition,
    ) -> Result<Document, StoreError>;

    /// Subscribe to post-write snapshots of a document.
    fn subscribe(&self, key: &str) -> broadcast::Receiver<Document>;
}
