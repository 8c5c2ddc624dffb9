//! Infrastructure layer modules
//!
//! This module contains shared infrastructure components:
//! - `auth`: JWT validation and operator claims
//! - `config`: Application configuration and settings
//! - `error`: HTTP-facing error type
//! - `metrics`: Prometheus metrics helpers
//! - `postgres`: PostgreSQL connection pool
//! - `redis`: Redis connection pool

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod postgres;
pub mod redis;
