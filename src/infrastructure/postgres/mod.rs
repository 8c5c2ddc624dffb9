//! PostgreSQL persistence module.
//!
//! Provides connection pooling and schema bootstrap for the PostgreSQL
//! document store backend.

pub mod pool;

pub use pool::{PostgresPool, PostgresPoolError};
