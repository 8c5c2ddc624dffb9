//! Tenant identity and initialization seed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::{ConfigError, ConfigResult};

const MAX_TENANT_ID_LEN: usize = 128;

/// Opaque tenant identifier.
///
/// Non-empty, at most 128 characters of `[A-Za-z0-9_.-]`, so it can be used
/// verbatim inside store keys and URL paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    pub fn parse(raw: impl Into<String>) -> ConfigResult<Self> {
        let raw = raw.into();

        if raw.is_empty() || raw.len() > MAX_TENANT_ID_LEN {
            return Err(ConfigError::validation(format!(
                "Tenant id must be 1-{} characters",
                MAX_TENANT_ID_LEN
            )));
        }

        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(ConfigError::validation(format!(
                "Tenant id '{}' may only contain letters, digits, '-', '_' or '.'",
                raw
            )));
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of this tenant's record in the document store.
    pub fn document_key(&self) -> String {
        format!("tenants/{}", self.0)
    }
}

impl TryFrom<String> for TenantId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Values used to build a tenant's first configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSeed {
    /// Organization display name; becomes `ui.headerTitle`
    pub display_name: String,
}

impl TenantSeed {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }
}
