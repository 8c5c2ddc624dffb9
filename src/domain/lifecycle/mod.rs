//! Tenant configuration lifecycle: state machine, repository and the
//! draft/publish manager.

pub mod manager;
pub mod repository;
pub mod state;

pub use manager::{DraftPublishManager, PreviewMode};
pub use repository::{
    ConfigRepository, ConfigWrite, TenantSnapshot, TenantSubscription, DRAFT_FIELD, LIVE_FIELD,
};
pub use state::{ConfigStatus, LifecycleOp};
