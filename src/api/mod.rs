//! API layer - HTTP endpoint handlers organized by domain.

mod catalog;
mod config;
mod health;
mod metrics;
mod routes;
mod template;

pub use config::{EditRequest, RenderQuery, TenantConfigResponse};
pub use health::{health, HealthResponse, StoreHealthResponse};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
pub use template::{ReorderRequest, TemplateListResponse};
