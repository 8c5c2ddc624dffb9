//! Versioned document storage.
//!
//! Tenant configurations and the global template catalog are both stored as
//! documents: named top-level fields updated atomically under a version
//! precondition. Backends:
//! - `memory`: DashMap, single process
//! - `redis`: hash per document, Lua compare-and-set, pub/sub change relay
//! - `postgres`: JSONB row per document, transactional compare-and-set

pub mod backend;
pub mod factory;
pub mod memory_backend;
pub mod notifier;
pub mod postgres_backend;
pub mod redis_backend;

pub use backend::{Document, DocumentStore, FieldUpdate, Precondition, StoreBackend, StoreError};
pub use factory::create_document_store;
pub use memory_backend::MemoryDocumentStore;
pub use notifier::ChangeNotifier;
pub use postgres_backend::PostgresDocumentStore;
pub use redis_backend::RedisDocumentStore;
