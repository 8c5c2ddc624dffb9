//! Domain layer modules
//!
//! This module contains the configuration engine:
//! - `model`: configuration and template data types
//! - `merge`: section merge engine with typed partial inputs
//! - `lifecycle`: draft/publish state machine and manager
//! - `template`: tenant template library
//! - `catalog`: global template catalog

pub mod catalog;
pub mod error;
pub mod lifecycle;
pub mod merge;
pub mod model;
pub mod template;

pub use error::{ConfigError, ConfigResult};
