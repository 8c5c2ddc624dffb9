//! Typed tenant-record facade over the document store.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::domain::error::{ConfigError, ConfigResult};
use crate::domain::model::{Configuration, TenantId};
use crate::metrics::LifecycleMetrics;
use crate::store::{Document, DocumentStore, FieldUpdate, Precondition};

use super::state::ConfigStatus;

pub const LIVE_FIELD: &str = "liveConfig";
pub const DRAFT_FIELD: &str = "draftConfig";

/// A tenant record as read at one store version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSnapshot {
    pub tenant_id: TenantId,
    #[serde(rename = "liveConfig", skip_serializing_if = "Option::is_none")]
    pub live: Option<Configuration>,
    #[serde(rename = "draftConfig", skip_serializing_if = "Option::is_none")]
    pub draft: Option<Configuration>,
    /// Store version; 0 if the record was never written
    pub version: u64,
}

impl TenantSnapshot {
    pub fn status(&self) -> ConfigStatus {
        ConfigStatus::from_fields(self.live.is_some(), self.draft.is_some())
    }

    /// Draft if present, otherwise live.
    pub fn working(&self) -> Option<&Configuration> {
        self.draft.as_ref().or(self.live.as_ref())
    }

    fn from_document(tenant_id: &TenantId, doc: &Document) -> ConfigResult<Self> {
        Ok(Self {
            tenant_id: tenant_id.clone(),
            live: decode_field(doc, LIVE_FIELD)?,
            draft: decode_field(doc, DRAFT_FIELD)?,
            version: doc.version,
        })
    }
}

fn decode_field(doc: &Document, field: &str) -> ConfigResult<Option<Configuration>> {
    doc.field(field)
        .map(|value| {
            serde_json::from_value(value.clone()).map_err(|e| {
                ConfigError::PersistenceFailure(format!(
                    "Stored {} of {} is malformed: {}",
                    field, doc.key, e
                ))
            })
        })
        .transpose()
}

fn encode(config: &Configuration) -> ConfigResult<Value> {
    serde_json::to_value(config)
        .map_err(|e| ConfigError::PersistenceFailure(format!("Failed to encode configuration: {}", e)))
}

/// A single store write against a tenant record.
///
/// Each variant touches only `liveConfig` and/or `draftConfig` and is
/// applied as one atomic multi-field update.
#[derive(Debug, Clone)]
pub enum ConfigWrite {
    /// Set `liveConfig`
    SetLive(Configuration),
    /// Set `draftConfig`
    SetDraft(Configuration),
    /// Set `liveConfig` to the given draft and remove `draftConfig`
    Promote(Configuration),
    /// Remove `draftConfig`
    ClearDraft,
    /// Remove both fields
    ClearAll,
}

impl ConfigWrite {
    fn into_updates(self) -> ConfigResult<Vec<FieldUpdate>> {
        Ok(match self {
            ConfigWrite::SetLive(config) => vec![FieldUpdate::set(LIVE_FIELD, encode(&config)?)],
            ConfigWrite::SetDraft(config) => vec![FieldUpdate::set(DRAFT_FIELD, encode(&config)?)],
            ConfigWrite::Promote(config) => vec![
                FieldUpdate::set(LIVE_FIELD, encode(&config)?),
                FieldUpdate::remove(DRAFT_FIELD),
            ],
            ConfigWrite::ClearDraft => vec![FieldUpdate::remove(DRAFT_FIELD)],
            ConfigWrite::ClearAll => vec![
                FieldUpdate::remove(LIVE_FIELD),
                FieldUpdate::remove(DRAFT_FIELD),
            ],
        })
    }
}

/// Tenant-keyed access to configuration records.
#[derive(Clone)]
pub struct ConfigRepository {
    store: Arc<dyn DocumentStore>,
}

impl ConfigRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Read a tenant record. A never-written record loads as uninitialized
    /// at version 0.
    pub async fn load(&self, tenant_id: &TenantId) -> ConfigResult<TenantSnapshot> {
        let doc = self.store.get(&tenant_id.document_key()).await?;

        match doc {
            Some(doc) => TenantSnapshot::from_document(tenant_id, &doc),
            None => Ok(TenantSnapshot {
                tenant_id: tenant_id.clone(),
                live: None,
                draft: None,
                version: 0,
            }),
        }
    }

    /// Apply one write, conditional on `precondition`.
    pub async fn write(
        &self,
        tenant_id: &TenantId,
        write: ConfigWrite,
        precondition: Precondition,
    ) -> ConfigResult<TenantSnapshot> {
        let updates = write.into_updates()?;
        let doc = self
            .store
            .update_fields(&tenant_id.document_key(), updates, precondition)
            .await?;
        TenantSnapshot::from_document(tenant_id, &doc)
    }

    pub fn subscribe(&self, tenant_id: &TenantId) -> TenantSubscription {
        TenantSubscription::new(
            tenant_id.clone(),
            self.store.subscribe(&tenant_id.document_key()),
        )
    }
}

/// Stream of post-write snapshots of one tenant record.
pub struct TenantSubscription {
    tenant_id: TenantId,
    receiver: broadcast::Receiver<Document>,
    last_version: u64,
}

impl TenantSubscription {
    fn new(tenant_id: TenantId, receiver: broadcast::Receiver<Document>) -> Self {
        LifecycleMetrics::subscription_opened();
        Self {
            tenant_id,
            receiver,
            last_version: 0,
        }
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Wait for the next snapshot. Returns `None` once the store stops
    /// delivering. A lagging subscriber skips to the newest snapshot, and
    /// versions never go backwards.
    pub async fn next(&mut self) -> Option<ConfigResult<TenantSnapshot>> {
        loop {
            match self.receiver.recv().await {
                Ok(doc) if doc.version <= self.last_version => {}
                Ok(doc) => {
                    self.last_version = doc.version;
                    return Some(TenantSnapshot::from_document(&self.tenant_id, &doc));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        tenant_id = %self.tenant_id,
                        skipped,
                        "Subscriber lagged, skipping to newest snapshot"
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for TenantSubscription {
    fn drop(&mut self) {
        LifecycleMetrics::subscription_closed();
    }
}
