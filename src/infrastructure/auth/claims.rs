use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Role allowed to act on any tenant's configuration
pub const PLATFORM_ADMIN_ROLE: &str = "platform_admin";

/// Role allowed to curate the global template catalog
pub const CATALOG_MAINTAINER_ROLE: &str = "catalog_maintainer";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (operator ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Operator roles
    #[serde(default)]
    pub roles: Vec<String>,
    /// Tenant the operator administers
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Additional custom claims
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    pub fn operator_id(&self) -> &str {
        &self.sub
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_platform_admin(&self) -> bool {
        self.has_role(PLATFORM_ADMIN_ROLE)
    }

    pub fn is_catalog_maintainer(&self) -> bool {
        self.has_role(CATALOG_MAINTAINER_ROLE)
    }

    /// Whether these claims may read and write the given tenant's configuration.
    pub fn can_manage_tenant(&self, tenant_id: &str) -> bool {
        self.is_platform_admin() || self.tenant_id.as_deref() == Some(tenant_id)
    }

    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp < now
    }
}
