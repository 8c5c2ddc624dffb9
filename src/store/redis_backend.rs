//! Redis-based document store backend.
//!
//! Each document is a Redis hash at `{prefix}:doc:{key}`. Every top-level
//! field is stored as a JSON string under its own hash field, next to a
//! `_version` counter. Writes run as one Lua script so the version check and
//! all field updates apply atomically.
//!
//! After a write the store publishes a change notice on `{prefix}:changes`.
//! Other instances running [`RedisDocumentStore::spawn_change_listener`]
//! re-read the document and push it to their local subscribers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::metrics::StoreMetrics;
use crate::redis::RedisPool;

use super::backend::{Document, DocumentStore, FieldUpdate, Precondition, StoreBackend, StoreError};
use super::notifier::ChangeNotifier;

const VERSION_FIELD: &str = "_version";

/// Reconnect delay for the change listener
const LISTENER_RETRY_DELAY: Duration = Duration::from_secs(5);

/// KEYS[1] = document hash
/// ARGV[1] = expected version, or "" for no check
/// ARGV[2] = JSON object of field -> serialized value to set
/// ARGV[3] = JSON array of fields to delete
///
/// Returns {"conflict", current_version} or {"ok", HGETALL...}.
const UPDATE_SCRIPT: &str = r#"
local current = tonumber(redis.call('HGET', KEYS[1], '_version') or '0')
if ARGV[1] ~= '' and tonumber(ARGV[1]) ~= current then
  return {'conflict', tostring(current)}
end
for field, value in pairs(cjson.decode(ARGV[2])) do
  redis.call('HSET', KEYS[1], field, value)
end
for _, field in ipairs(cjson.decode(ARGV[3])) do
  redis.call('HDEL', KEYS[1], field)
end
redis.call('HINCRBY', KEYS[1], '_version', 1)
local result = {'ok'}
for _, item in ipairs(redis.call('HGETALL', KEYS[1])) do
  table.insert(result, item)
end
return result
"#;

/// Cross-instance change notification payload.
#[derive(Debug, Serialize, Deserialize)]
struct ChangeNotice {
    key: String,
    version: u64,
    origin: String,
}

/// Redis-based document store.
pub struct RedisDocumentStore {
    pool: Arc<RedisPool>,
    prefix: String,
    /// Distinguishes this process's own change notices
    instance_id: String,
    script: redis::Script,
    notifier: ChangeNotifier,
}

impl RedisDocumentStore {
    pub fn new(pool: Arc<RedisPool>, prefix: String, subscription_buffer: usize) -> Self {
        Self {
            pool,
            prefix,
            instance_id: Uuid::new_v4().to_string(),
            script: redis::Script::new(UPDATE_SCRIPT),
            notifier: ChangeNotifier::new(subscription_buffer),
        }
    }

    fn document_key(&self, key: &str) -> String {
        format!("{}:doc:{}", self.prefix, key)
    }

    fn changes_channel(&self) -> String {
        format!("{}:changes", self.prefix)
    }

    /// Start relaying change notices from other instances to local
    /// subscribers. Must be called from within a Tokio runtime.
    pub fn spawn_change_listener(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                if let Err(e) = self.listen_for_changes().await {
                    tracing::warn!(
                        error = %e,
                        retry_in_secs = LISTENER_RETRY_DELAY.as_secs(),
                        "Redis change listener disconnected"
                    );
                }
                tokio::time::sleep(LISTENER_RETRY_DELAY).await;
            }
        })
    }

    async fn listen_for_changes(&self) -> Result<(), StoreError> {
        let mut pubsub = self.pool.client().get_async_pubsub().await?;
        pubsub.subscribe(self.changes_channel()).await?;
        tracing::info!(channel = %self.changes_channel(), "Listening for document changes");

        let mut messages = pubsub.on_message();
        while let Some(msg) = messages.next().await {
            let payload: String = msg.get_payload()?;
            let notice: ChangeNotice = match serde_json::from_str(&payload) {
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring malformed change notice");
                    continue;
                }
            };

            if notice.origin == self.instance_id {
                continue;
            }

            tracing::debug!(key = %notice.key, version = notice.version, "Remote document change");
            if let Some(doc) = self.get(&notice.key).await? {
                self.notifier.publish(&doc);
            }
        }

        Ok(())
    }

    async fn publish_change(&self, document: &Document) {
        let notice = ChangeNotice {
            key: document.key.clone(),
            version: document.version,
            origin: self.instance_id.clone(),
        };
        let Ok(payload) = serde_json::to_string(&notice) else {
            return;
        };
        let channel = self.changes_channel();

        let result = self
            .pool
            .execute(|mut conn| async move {
                let _: i64 = conn.publish(channel, payload).await?;
                Ok(())
            })
            .await;

        if let Err(e) = result {
            tracing::warn!(key = %document.key, error = %e, "Failed to publish change notice");
        }
    }
}

/// Decode the flat `field, value, field, value...` list of a hash.
fn decode_hash<I>(key: &str, pairs: I) -> Result<Document, StoreError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut doc = Document::empty(key);

    for (field, raw) in pairs {
        if field == VERSION_FIELD {
            doc.version = raw.parse().map_err(|_| StoreError::Corrupt {
                key: key.to_string(),
                reason: format!("invalid version '{}'", raw),
            })?;
        } else {
            let value: Value = serde_json::from_str(&raw)?;
            doc.fields.insert(field, value);
        }
    }

    Ok(doc)
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    fn backend_type(&self) -> StoreBackend {
        StoreBackend::Redis
    }

    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        let started = Instant::now();
        let redis_key = self.document_key(key);

        let raw: HashMap<String, String> = self
            .pool
            .execute(|mut conn| async move { conn.hgetall(redis_key).await })
            .await
            .inspect_err(|_| StoreMetrics::record_error("redis", "get"))?;

        StoreMetrics::record_latency("redis", "get", started.elapsed());

        if raw.is_empty() {
            return Ok(None);
        }
        decode_hash(key, raw).map(Some)
    }

    async fn update_fields(
        &self,
        key: &str,
        updates: Vec<FieldUpdate>,
        precondition: Precondition,
    ) -> Result<Document, StoreError> {
        let started = Instant::now();

        let mut sets = Map::new();
        let mut deletes = Vec::new();
        for update in &updates {
            match &update.value {
                Some(value) => {
                    sets.insert(update.field.clone(), Value::String(serde_json::to_string(value)?));
                }
                None => deletes.push(Value::String(update.field.clone())),
            }
        }

        let expected = match precondition {
            Precondition::Any => String::new(),
            Precondition::Version(v) => v.to_string(),
        };
        let sets = serde_json::to_string(&sets)?;
        let deletes = serde_json::to_string(&deletes)?;
        let redis_key = self.document_key(key);
        let script = &self.script;

        let reply: Vec<String> = self
            .pool
            .execute(|mut conn| async move {
                script
                    .key(redis_key)
                    .arg(expected)
                    .arg(sets)
                    .arg(deletes)
                    .invoke_async(&mut conn)
                    .await
            })
            .await
            .inspect_err(|_| StoreMetrics::record_error("redis", "update_fields"))?;

        let mut reply = reply.into_iter();
        match reply.next().as_deref() {
            Some("ok") => {}
            Some("conflict") => {
                StoreMetrics::record_conflict("redis");
                let actual = reply.next().and_then(|v| v.parse().ok()).unwrap_or_default();
                return Err(StoreError::Conflict {
                    key: key.to_string(),
                    expected: match precondition {
                        Precondition::Version(v) => v,
                        Precondition::Any => actual,
                    },
                    actual,
                });
            }
            other => {
                return Err(StoreError::Corrupt {
                    key: key.to_string(),
                    reason: format!("unexpected script reply {:?}", other),
                })
            }
        }

        let rest: Vec<String> = reply.collect();
        let pairs = rest
            .chunks(2)
            .filter(|pair| pair.len() == 2)
            .map(|pair| (pair[0].clone(), pair[1].clone()));
        let written = decode_hash(key, pairs)?;

        StoreMetrics::record_latency("redis", "update_fields", started.elapsed());
        tracing::debug!(key = %key, version = written.version, "Document updated in Redis");

        self.notifier.publish(&written);
        self.publish_change(&written).await;
        Ok(written)
    }

    fn subscribe(&self, key: &str) -> broadcast::Receiver<Document> {
        self.notifier.subscribe(key)
    }
}
