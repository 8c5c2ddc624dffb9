// Infrastructure layer (shared components)
pub mod infrastructure;

// Re-export infrastructure modules for shorter paths
pub use infrastructure::auth;
pub use infrastructure::config;
pub use infrastructure::error;
pub use infrastructure::metrics;
pub use infrastructure::postgres;
pub use infrastructure::redis;

// Domain layer (business logic)
pub mod domain;
pub mod store;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod telemetry;

pub use domain::catalog::{CatalogMaintainer, GlobalTemplateCatalog};
pub use domain::lifecycle::{ConfigStatus, DraftPublishManager, PreviewMode, TenantSnapshot};
pub use domain::template::TemplateLibrary;
pub use domain::{ConfigError, ConfigResult};
