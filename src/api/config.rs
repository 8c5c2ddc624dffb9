//! Tenant configuration lifecycle endpoints.
//!
//! Every write response carries the new store version as an `ETag`; clients
//! pass it back in `If-Match` to make the next write conditional on it.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};

use crate::domain::lifecycle::{ConfigStatus, PreviewMode, TenantSnapshot};
use crate::domain::merge::SectionUpdate;
use crate::domain::model::{Configuration, MapDefinition, TenantSeed};
use crate::error::AppError;
use crate::server::{expected_version, AppState, AuthClaims};

/// A tenant record with its derived lifecycle status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfigResponse {
    pub status: ConfigStatus,
    #[serde(flatten)]
    pub snapshot: TenantSnapshot,
}

impl From<TenantSnapshot> for TenantConfigResponse {
    fn from(snapshot: TenantSnapshot) -> Self {
        Self {
            status: snapshot.status(),
            snapshot,
        }
    }
}

impl IntoResponse for TenantConfigResponse {
    fn into_response(self) -> Response {
        let etag = format!("\"{}\"", self.snapshot.version);
        ([(header::ETAG, etag)], Json(self)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RenderQuery {
    #[serde(default)]
    pub preview: PreviewMode,
}

/// PATCH body: one section update or several applied in order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EditRequest {
    Many(Vec<SectionUpdate>),
    One(SectionUpdate),
}

impl EditRequest {
    fn into_updates(self) -> Vec<SectionUpdate> {
        match self {
            EditRequest::Many(updates) => updates,
            EditRequest::One(update) => vec![update],
        }
    }
}

/// GET /api/v1/tenants/{tenant_id}/config
#[tracing::instrument(name = "http.get_config", skip(state, auth))]
pub async fn get_config(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path(tenant_id): Path<String>,
) -> Result<TenantConfigResponse, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    Ok(state.manager.snapshot(&tenant_id).await?.into())
}

/// GET /api/v1/tenants/{tenant_id}/config/render?preview=draft
#[tracing::instrument(name = "http.render_config", skip(state, auth))]
pub async fn render_config(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path(tenant_id): Path<String>,
    Query(query): Query<RenderQuery>,
) -> Result<Json<Configuration>, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let config = state
        .manager
        .resolve_for_render(&tenant_id, query.preview)
        .await?;
    Ok(Json(config))
}

/// POST /api/v1/tenants/{tenant_id}/config/initialize
#[tracing::instrument(name = "http.initialize_config", skip(state, auth, seed))]
pub async fn initialize_config(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path(tenant_id): Path<String>,
    Json(seed): Json<TenantSeed>,
) -> Result<(StatusCode, TenantConfigResponse), AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let snapshot = state.manager.initialize(&tenant_id, &seed).await?;
    Ok((StatusCode::CREATED, snapshot.into()))
}

/// PATCH /api/v1/tenants/{tenant_id}/config - edit the draft
#[tracing::instrument(name = "http.edit_config", skip(state, auth, headers, request))]
pub async fn edit_config(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<EditRequest>,
) -> Result<TenantConfigResponse, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let expected = expected_version(&headers)?;
    let updates = request.into_updates();
    if updates.is_empty() {
        return Err(AppError::Validation("No section updates given".to_string()));
    }

    let snapshot = state
        .manager
        .edit_sections(&tenant_id, updates, expected)
        .await?;
    Ok(snapshot.into())
}

/// POST /api/v1/tenants/{tenant_id}/config/publish
#[tracing::instrument(name = "http.publish_config", skip(state, auth, headers))]
pub async fn publish_config(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
) -> Result<TenantConfigResponse, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let expected = expected_version(&headers)?;
    Ok(state.manager.publish(&tenant_id, expected).await?.into())
}

/// POST /api/v1/tenants/{tenant_id}/config/discard
#[tracing::instrument(name = "http.discard_draft", skip(state, auth, headers))]
pub async fn discard_draft(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
) -> Result<TenantConfigResponse, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let expected = expected_version(&headers)?;
    Ok(state.manager.discard(&tenant_id, expected).await?.into())
}

/// DELETE /api/v1/tenants/{tenant_id}/config
#[tracing::instrument(name = "http.uninitialize_config", skip(state, auth, headers))]
pub async fn uninitialize_config(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
) -> Result<TenantConfigResponse, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let expected = expected_version(&headers)?;
    Ok(state.manager.uninitialize(&tenant_id, expected).await?.into())
}

/// PUT /api/v1/tenants/{tenant_id}/config/maps - replace the map list
#[tracing::instrument(name = "http.set_maps", skip(state, auth, headers, maps))]
pub async fn set_maps(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
    Json(maps): Json<Vec<MapDefinition>>,
) -> Result<TenantConfigResponse, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let expected = expected_version(&headers)?;
    Ok(state.manager.set_maps(&tenant_id, maps, expected).await?.into())
}

/// POST /api/v1/tenants/{tenant_id}/config/maps
#[tracing::instrument(name = "http.add_map", skip(state, auth, headers, map))]
pub async fn add_map(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
    Json(map): Json<MapDefinition>,
) -> Result<(StatusCode, TenantConfigResponse), AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let expected = expected_version(&headers)?;
    let snapshot = state.manager.add_map(&tenant_id, map, expected).await?;
    Ok((StatusCode::CREATED, snapshot.into()))
}

/// DELETE /api/v1/tenants/{tenant_id}/config/maps/{map_id}
#[tracing::instrument(name = "http.remove_map", skip(state, auth, headers))]
pub async fn remove_map(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((tenant_id, map_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<TenantConfigResponse, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;
    let expected = expected_version(&headers)?;
    Ok(state.manager.remove_map(&tenant_id, &map_id, expected).await?.into())
}

/// GET /api/v1/tenants/{tenant_id}/config/stream
///
/// Sends the current record as a `snapshot` event, then one event per
/// committed write until the client disconnects.
#[tracing::instrument(name = "http.config_stream", skip(state, auth))]
pub async fn config_stream(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path(tenant_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let tenant_id = auth.authorize_tenant(&tenant_id)?;

    // Subscribe before reading so no write between the two is missed.
    let mut subscription = state.manager.subscribe(&tenant_id);
    let initial = state.manager.snapshot(&tenant_id).await?;

    tracing::info!(
        tenant_id = %tenant_id,
        operator_id = %auth.0.operator_id(),
        "Configuration stream opened"
    );

    let stream = async_stream::stream! {
        let mut last_version = initial.version;
        yield Ok(snapshot_event(initial.into()));

        while let Some(next) = subscription.next().await {
            match next {
                Ok(snapshot) if snapshot.version > last_version => {
                    last_version = snapshot.version;
                    yield Ok(snapshot_event(snapshot.into()));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        tenant_id = %subscription.tenant_id(),
                        error = %e,
                        "Dropping undecodable configuration change"
                    );
                }
            }
        }

        tracing::debug!(tenant_id = %subscription.tenant_id(), "Configuration stream closed");
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("heartbeat"),
    ))
}

fn snapshot_event(response: TenantConfigResponse) -> Event {
    let id = response.snapshot.version.to_string();
    match Event::default().event("snapshot").id(id).json_data(&response) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode configuration snapshot");
            Event::default().event("error").data("encode failed")
        }
    }
}
