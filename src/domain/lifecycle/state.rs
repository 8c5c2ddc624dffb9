//! Tenant configuration lifecycle state machine.

use serde::Serialize;

use crate::domain::error::{ConfigError, ConfigResult};
use crate::domain::model::TenantId;

/// Lifecycle state of a tenant's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigStatus {
    /// Neither `liveConfig` nor `draftConfig` exists
    Uninitialized,
    /// `liveConfig` only
    Live,
    /// A draft with unpublished changes exists
    LiveWithDraft,
}

/// Operations that move a tenant between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    Initialize,
    Edit,
    Publish,
    Discard,
    Uninitialize,
}

impl LifecycleOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleOp::Initialize => "initialize",
            LifecycleOp::Edit => "edit",
            LifecycleOp::Publish => "publish",
            LifecycleOp::Discard => "discard",
            LifecycleOp::Uninitialize => "uninitialize",
        }
    }
}

impl ConfigStatus {
    /// Derive the state from which fields are present.
    ///
    /// A record holding only a draft is treated as `LiveWithDraft`: the
    /// draft is what editors work on and what publish promotes.
    pub fn from_fields(has_live: bool, has_draft: bool) -> Self {
        match (has_live, has_draft) {
            (_, true) => ConfigStatus::LiveWithDraft,
            (true, false) => ConfigStatus::Live,
            (false, false) => ConfigStatus::Uninitialized,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigStatus::Uninitialized => "uninitialized",
            ConfigStatus::Live => "live",
            ConfigStatus::LiveWithDraft => "liveWithDraft",
        }
    }

    /// State after applying `op`, or the error the operation fails with.
    ///
    /// Preconditions that depend on the configuration content (such as the
    /// map list being empty before uninitialize) are checked by the caller.
    pub fn transition(self, op: LifecycleOp, tenant: &TenantId) -> ConfigResult<ConfigStatus> {
        use ConfigStatus::*;
        use LifecycleOp::*;

        let tenant = tenant.to_string();
        match (self, op) {
            (Uninitialized, Initialize) => Ok(Live),
            (Live | LiveWithDraft, Initialize) => Err(ConfigError::AlreadyInitialized(tenant)),

            (Uninitialized, Edit) => Err(not_initialized(tenant)),
            (Live | LiveWithDraft, Edit) => Ok(LiveWithDraft),

            (LiveWithDraft, Publish) => Ok(Live),
            (Uninitialized | Live, Publish) => Err(ConfigError::NoDraftToPublish(tenant)),

            (LiveWithDraft, Discard) => Ok(Live),
            (Uninitialized | Live, Discard) => Err(ConfigError::NoDraftToDiscard(tenant)),

            (Uninitialized, Uninitialize) => Err(not_initialized(tenant)),
            (Live | LiveWithDraft, Uninitialize) => Ok(Uninitialized),
        }
    }
}

fn not_initialized(tenant: String) -> ConfigError {
    ConfigError::NotFound(format!("Tenant {} has no configuration", tenant))
}
