//! PostgreSQL-based document store backend.
//!
//! Each document is one row of `atlas_documents` with its fields held in a
//! JSONB object. Writes lock the row, merge the touched fields, and upsert
//! conditional on the version read, all inside one transaction.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use tokio::sync::broadcast;

use crate::metrics::StoreMetrics;

use super::backend::{Document, DocumentStore, FieldUpdate, Precondition, StoreBackend, StoreError};
use super::notifier::ChangeNotifier;

/// PostgreSQL-based document store.
///
/// Change notifications are process-local; run a single writer instance or
/// pair this backend with an external change feed.
pub struct PostgresDocumentStore {
    pool: PgPool,
    notifier: ChangeNotifier,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool, subscription_buffer: usize) -> Self {
        Self {
            pool,
            notifier: ChangeNotifier::new(subscription_buffer),
        }
    }
}

fn decode_row(key: &str, body: Value, version: i64) -> Result<Document, StoreError> {
    let fields = match body {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(StoreError::Corrupt {
                key: key.to_string(),
                reason: format!("body is not an object: {}", other),
            })
        }
    };

    Ok(Document {
        key: key.to_string(),
        fields,
        version: u64::try_from(version).map_err(|_| StoreError::Corrupt {
            key: key.to_string(),
            reason: format!("negative version {}", version),
        })?,
    })
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    fn backend_type(&self) -> StoreBackend {
        StoreBackend::Postgres
    }

    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        let started = Instant::now();

        let row: Option<(Value, i64)> =
            sqlx::query_as("SELECT body, version FROM atlas_documents WHERE doc_key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .inspect_err(|_| StoreMetrics::record_error("postgres", "get"))?;

        StoreMetrics::record_latency("postgres", "get", started.elapsed());

        row.map(|(body, version)| decode_row(key, body, version))
            .transpose()
    }

    async fn update_fields(
        &self,
        key: &str,
        updates: Vec<FieldUpdate>,
        precondition: Precondition,
    ) -> Result<Document, StoreError> {
        let started = Instant::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .inspect_err(|_| StoreMetrics::record_error("postgres", "update_fields"))?;

        let row: Option<(Value, i64)> = sqlx::query_as(
            "SELECT body, version FROM atlas_documents WHERE doc_key = $1 FOR UPDATE",
        )
        .bind(key)
        .fetch_optional(&mut *tx)
        .await?;

        let mut doc = match row {
            Some((body, version)) => decode_row(key, body, version)?,
            None => Document::empty(key),
        };

        precondition
            .check(key, doc.version)
            .inspect_err(|_| StoreMetrics::record_conflict("postgres"))?;

        let previous = doc.version;
        doc.apply(&updates);
        doc.version = previous + 1;

        // A missing row is not locked by FOR UPDATE; the version guard on the
        // upsert catches a concurrent first write.
        let result = sqlx::query(
            r#"
            INSERT INTO atlas_documents (doc_key, body, version, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (doc_key) DO UPDATE
                SET body = EXCLUDED.body,
                    version = EXCLUDED.version,
                    updated_at = NOW()
                WHERE atlas_documents.version = $4
            "#,
        )
        .bind(key)
        .bind(Value::Object(doc.fields.clone()))
        .bind(doc.version as i64)
        .bind(previous as i64)
        .execute(&mut *tx)
        .await
        .inspect_err(|_| StoreMetrics::record_error("postgres", "update_fields"))?;

        if result.rows_affected() == 0 {
            StoreMetrics::record_conflict("postgres");
            return Err(StoreError::Conflict {
                key: key.to_string(),
                expected: previous,
                actual: previous + 1,
            });
        }

        tx.commit().await?;

        StoreMetrics::record_latency("postgres", "update_fields", started.elapsed());
        tracing::debug!(key = %key, version = doc.version, "Document updated in PostgreSQL");

        self.notifier.publish(&doc);
        Ok(doc)
    }

    fn subscribe(&self, key: &str) -> broadcast::Receiver<Document> {
        self.notifier.subscribe(key)
    }
}
