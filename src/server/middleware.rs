use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts, HeaderMap},
};
use serde::Deserialize;

use super::AppState;
use crate::auth::Claims;
use crate::domain::model::TenantId;
use crate::error::AppError;

/// Verified operator claims.
///
/// Read from `Authorization: Bearer <jwt>`, or from a `token` query parameter
/// for clients that cannot set headers (EventSource).
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl FromRequestParts<AppState> for AuthClaims {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match extract_bearer_token(&parts.headers) {
            Some(token) => token.to_string(),
            None => Query::<TokenQuery>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(q)| q.token)
                .ok_or_else(|| AppError::Auth("Missing authentication token".to_string()))?,
        };

        let claims = state.jwt_validator.validate(&token)?;
        if claims.is_expired() {
            return Err(AppError::Auth("Token expired".to_string()));
        }
        Ok(AuthClaims(claims))
    }
}

impl AuthClaims {
    /// Parse the tenant path segment and check these claims may manage it.
    pub fn authorize_tenant(&self, raw: &str) -> Result<TenantId, AppError> {
        let tenant_id = TenantId::parse(raw)?;
        if !self.0.can_manage_tenant(tenant_id.as_str()) {
            tracing::warn!(
                operator_id = %self.0.operator_id(),
                tenant_id = %tenant_id,
                "Tenant access denied"
            );
            return Err(AppError::Forbidden(format!(
                "Operator may not manage tenant {}",
                tenant_id
            )));
        }
        Ok(tenant_id)
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Read the expected store version from `If-Match`, accepting `3` or `"3"`.
/// `*` matches any version and leaves the write unconditional.
pub fn expected_version(headers: &HeaderMap) -> Result<Option<u64>, AppError> {
    let Some(value) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };

    let raw = value.to_str().map(str::trim).unwrap_or_default();
    if raw == "*" {
        return Ok(None);
    }

    raw.trim_start_matches("W/")
        .trim_matches('"')
        .parse::<u64>()
        .map(Some)
        .map_err(|_| AppError::Validation("If-Match must carry a numeric version".to_string()))
}
