//! Tenant template library endpoints.
//!
//! Editor sessions are stateless on the server: the `from-starter`,
//! `from-global` and `blank` endpoints return a prefilled template which the
//! client edits and then POSTs back to save. The saved template always gets
//! an id minted at save time; any id in the posted body is ignored.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::model::{ExportTemplate, TemplateKind};
use crate::domain::template::{
    list_starters, DeleteConfirmation, EditorSession, StarterInfo, TemplateInput,
};
use crate::error::AppError;
use crate::server::{expected_version, AppState, AuthClaims};

#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<ExportTemplate>,
    pub total: usize,
}

impl From<Vec<ExportTemplate>> for TemplateListResponse {
    fn from(templates: Vec<ExportTemplate>) -> Self {
        Self {
            total: templates.len(),
            templates,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Only enabled templates, as offered at export time
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// Must repeat the template id being deleted
    pub confirm: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<String>,
}

/// GET /api/v1/starters/{kind}
pub async fn get_starters(
    _auth: AuthClaims,
    Path(kind): Path<TemplateKind>,
) -> Json<&'static [StarterInfo]> {
    Json(list_starters(kind))
}

/// GET /api/v1/tenants/{tenant_id}/templates/{kind}
#[tracing::instrument(name = "http.list_templates", skip(state, auth))]
pub async fn list_templates(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((tenant_id, kind)): Path<(String, TemplateKind)>,
    Query(query): Query<ListQuery>,
) -> Result<Json<TemplateListResponse>, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let templates = if query.enabled {
        state.library.list_enabled(&tenant_id, kind).await?
    } else {
        state.library.list(&tenant_id, kind).await?
    };
    Ok(Json(templates.into()))
}

/// GET /api/v1/tenants/{tenant_id}/templates/{kind}/{id}
#[tracing::instrument(name = "http.get_template", skip(state, auth))]
pub async fn get_template(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((tenant_id, kind, id)): Path<(String, TemplateKind, String)>,
) -> Result<Json<ExportTemplate>, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    Ok(Json(state.library.get(&tenant_id, kind, &id).await?))
}

/// POST /api/v1/tenants/{tenant_id}/templates/{kind}/blank
#[tracing::instrument(name = "http.blank_session", skip(state, auth))]
pub async fn blank_session(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((tenant_id, kind)): Path<(String, TemplateKind)>,
) -> Result<Json<EditorSession>, AppError> {
    auth.authorize_tenant(&tenant_id)?;
    Ok(Json(state.library.create_blank(kind)))
}

/// POST /api/v1/tenants/{tenant_id}/templates/{kind}/from-starter/{starter_id}
#[tracing::instrument(name = "http.starter_session", skip(state, auth))]
pub async fn starter_session(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((tenant_id, kind, starter_id)): Path<(String, TemplateKind, String)>,
) -> Result<Json<EditorSession>, AppError> {
    auth.authorize_tenant(&tenant_id)?;
    Ok(Json(state.library.create_from_starter(kind, &starter_id)?))
}

/// POST /api/v1/tenants/{tenant_id}/templates/{kind}/from-global/{global_id}
#[tracing::instrument(name = "http.global_session", skip(state, auth))]
pub async fn global_session(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((tenant_id, kind, global_id)): Path<(String, TemplateKind, String)>,
) -> Result<Json<EditorSession>, AppError> {
    auth.authorize_tenant(&tenant_id)?;
    Ok(Json(state.library.create_from_global(kind, &global_id).await?))
}

/// POST /api/v1/tenants/{tenant_id}/templates/{kind} - save a new template
#[tracing::instrument(name = "http.create_template", skip(state, auth, headers, input))]
pub async fn create_template(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((tenant_id, kind)): Path<(String, TemplateKind)>,
    headers: HeaderMap,
    Json(input): Json<TemplateInput>,
) -> Result<(StatusCode, Json<ExportTemplate>), AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let expected = expected_version(&headers)?;

    let mut session = state.library.create_blank(kind);
    session.apply(input);

    let saved = state.library.save(&tenant_id, session, expected).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// PUT /api/v1/tenants/{tenant_id}/templates/{kind}/{id}
#[tracing::instrument(name = "http.update_template", skip(state, auth, headers, input))]
pub async fn update_template(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((tenant_id, kind, id)): Path<(String, TemplateKind, String)>,
    headers: HeaderMap,
    Json(input): Json<TemplateInput>,
) -> Result<Json<ExportTemplate>, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let expected = expected_version(&headers)?;

    let mut session = state.library.edit_existing(&tenant_id, kind, &id).await?;
    session.apply(input);
    Ok(Json(state.library.save(&tenant_id, session, expected).await?))
}

/// DELETE /api/v1/tenants/{tenant_id}/templates/{kind}/{id}?confirm={id}
#[tracing::instrument(name = "http.delete_template", skip(state, auth))]
pub async fn delete_template(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((tenant_id, kind, id)): Path<(String, TemplateKind, String)>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<ExportTemplate>, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let confirm = query.confirm.ok_or_else(|| {
        AppError::Validation("Deleting a template requires ?confirm=<template id>".to_string())
    })?;

    let removed = state
        .library
        .delete(&tenant_id, kind, &id, DeleteConfirmation::for_template(confirm))
        .await?;
    Ok(Json(removed))
}

/// POST /api/v1/tenants/{tenant_id}/templates/{kind}/{id}/duplicate
#[tracing::instrument(name = "http.duplicate_template", skip(state, auth))]
pub async fn duplicate_template(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((tenant_id, kind, id)): Path<(String, TemplateKind, String)>,
) -> Result<(StatusCode, Json<ExportTemplate>), AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let copy = state.library.duplicate(&tenant_id, kind, &id).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// POST /api/v1/tenants/{tenant_id}/templates/{kind}/{id}/toggle
#[tracing::instrument(name = "http.toggle_template", skip(state, auth))]
pub async fn toggle_template(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((tenant_id, kind, id)): Path<(String, TemplateKind, String)>,
) -> Result<Json<ExportTemplate>, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    Ok(Json(state.library.toggle_enabled(&tenant_id, kind, &id).await?))
}

/// PUT /api/v1/tenants/{tenant_id}/templates/{kind}/order
#[tracing::instrument(name = "http.reorder_templates", skip(state, auth, request))]
pub async fn reorder_templates(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((tenant_id, kind)): Path<(String, TemplateKind)>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<TemplateListResponse>, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let templates = state.library.reorder(&tenant_id, kind, &request.ids).await?;
    Ok(Json(templates.into()))
}
