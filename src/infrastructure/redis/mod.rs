//! Redis connectivity for the Redis document store backend.

pub mod pool;

pub use pool::{PoolError, RedisPool};
