//! In-memory document store backend using DashMap.
//!
//! Documents are lost on restart. Used for development, tests, and single
//! instance deployments that seed their configuration at startup.

use std::time::Instant;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::metrics::StoreMetrics;

use super::backend::{Document, DocumentStore, FieldUpdate, Precondition, StoreBackend, StoreError};
use super::notifier::ChangeNotifier;

/// In-memory document store.
///
/// The DashMap entry lock makes the version check and the field updates of
/// one write a single critical section.
pub struct MemoryDocumentStore {
    documents: DashMap<String, Document>,
    notifier: ChangeNotifier,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_subscription_buffer(16)
    }

    pub fn with_subscription_buffer(capacity: usize) -> Self {
        Self {
            documents: DashMap::new(),
            notifier: ChangeNotifier::new(capacity),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn backend_type(&self) -> StoreBackend {
        StoreBackend::Memory
    }

    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.get(key).map(|doc| doc.clone()))
    }

    async fn update_fields(
        &self,
        key: &str,
        updates: Vec<FieldUpdate>,
        precondition: Precondition,
    ) -> Result<Document, StoreError> {
        let started = Instant::now();

        let written = match self.documents.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let doc = occupied.get_mut();
                precondition.check(key, doc.version).inspect_err(|_| {
                    StoreMetrics::record_conflict("memory");
                })?;
                doc.apply(&updates);
                doc.version += 1;
                doc.clone()
            }
            Entry::Vacant(vacant) => {
                precondition.check(key, 0).inspect_err(|_| {
                    StoreMetrics::record_conflict("memory");
                })?;
                let mut doc = Document::empty(key);
                doc.apply(&updates);
                doc.version = 1;
                vacant.insert(doc.clone());
                doc
            }
        };

        StoreMetrics::record_latency("memory", "update_fields", started.elapsed());
        tracing::debug!(
            key = %key,
            version = written.version,
            fields = updates.len(),
            "Document updated"
        );

        self.notifier.publish(&written);
        Ok(written)
    }

    fn subscribe(&self, key: &str) -> broadcast::Receiver<Document> {
        self.notifier.subscribe(key)
    }
}
