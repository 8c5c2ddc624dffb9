//! Factory function for creating document stores

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::postgres::PostgresPool;
use crate::redis::RedisPool;

use super::backend::DocumentStore;
use super::memory_backend::MemoryDocumentStore;
use super::postgres_backend::PostgresDocumentStore;
use super::redis_backend::RedisDocumentStore;

/// Create a document store based on configuration.
///
/// Falls back to the in-memory store when the configured backend's pool is
/// not available. The Redis store's change listener is started here, so this
/// must run inside a Tokio runtime when `backend = "redis"`.
pub fn create_document_store(
    config: &StoreConfig,
    redis_pool: Option<Arc<RedisPool>>,
    postgres_pool: Option<Arc<PostgresPool>>,
) -> Arc<dyn DocumentStore> {
    match config.backend.to_ascii_lowercase().as_str() {
        "redis" => {
            if let Some(pool) = redis_pool {
                tracing::info!(prefix = %config.redis_prefix, "Using Redis document store");
                let store = Arc::new(RedisDocumentStore::new(
                    pool,
                    config.redis_prefix.clone(),
                    config.subscription_buffer,
                ));
                store.clone().spawn_change_listener();
                return store;
            }
            tracing::warn!("Redis document store requested but Redis pool not available, falling back to memory");
        }
        "postgres" => {
            if let Some(pool) = postgres_pool {
                tracing::info!(url = %pool.database_url_masked(), "Using PostgreSQL document store");
                return Arc::new(PostgresDocumentStore::new(
                    pool.pool().clone(),
                    config.subscription_buffer,
                ));
            }
            tracing::warn!("PostgreSQL document store requested but database not configured, falling back to memory");
        }
        "memory" => {
            tracing::info!("Using in-memory document store");
        }
        other => {
            tracing::warn!(backend = %other, "Unknown document store backend, falling back to memory");
        }
    }

    Arc::new(MemoryDocumentStore::with_subscription_buffer(
        config.subscription_buffer,
    ))
}
