//! Global template catalog endpoints.
//!
//! Reads are open to any authenticated operator. Writes need the catalog
//! maintainer role.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;

use crate::domain::catalog::{CatalogMaintainer, CatalogSnapshot};
use crate::domain::model::{ExportTemplate, TemplateKind};
use crate::domain::template::TemplateInput;
use crate::error::AppError;
use crate::server::{AppState, AuthClaims};

use super::template::TemplateListResponse;

/// GET /api/v1/catalog
pub async fn get_catalog(
    State(state): State<AppState>,
    _auth: AuthClaims,
) -> Result<Json<CatalogSnapshot>, AppError> {
    Ok(Json(state.catalog.snapshot().await?))
}

/// GET /api/v1/catalog/{kind}
pub async fn list_global_templates(
    State(state): State<AppState>,
    _auth: AuthClaims,
    Path(kind): Path<TemplateKind>,
) -> Result<Json<TemplateListResponse>, AppError> {
    Ok(Json(state.catalog.list(kind).await?.into()))
}

/// GET /api/v1/catalog/{kind}/{id}
pub async fn get_global_template(
    State(state): State<AppState>,
    _auth: AuthClaims,
    Path((kind, id)): Path<(TemplateKind, String)>,
) -> Result<Json<ExportTemplate>, AppError> {
    Ok(Json(state.catalog.get(kind, &id).await?))
}

/// POST /api/v1/catalog/{kind}
#[tracing::instrument(name = "http.create_global_template", skip(state, auth, input))]
pub async fn create_global_template(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path(kind): Path<TemplateKind>,
    Json(input): Json<TemplateInput>,
) -> Result<(StatusCode, Json<ExportTemplate>), AppError> {
    let maintainer = CatalogMaintainer::from_claims(&auth.0)?;
    let created = state.catalog.create(&maintainer, kind, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/catalog/{kind}/{id}
#[tracing::instrument(name = "http.update_global_template", skip(state, auth, input))]
pub async fn update_global_template(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((kind, id)): Path<(TemplateKind, String)>,
    Json(input): Json<TemplateInput>,
) -> Result<Json<ExportTemplate>, AppError> {
    let maintainer = CatalogMaintainer::from_claims(&auth.0)?;
    Ok(Json(state.catalog.update(&maintainer, kind, &id, input).await?))
}

/// DELETE /api/v1/catalog/{kind}/{id}
#[tracing::instrument(name = "http.delete_global_template", skip(state, auth))]
pub async fn delete_global_template(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((kind, id)): Path<(TemplateKind, String)>,
) -> Result<Json<ExportTemplate>, AppError> {
    let maintainer = CatalogMaintainer::from_claims(&auth.0)?;
    Ok(Json(state.catalog.delete(&maintainer, kind, &id).await?))
}

/// POST /api/v1/catalog/{kind}/{id}/duplicate
#[tracing::instrument(name = "http.duplicate_global_template", skip(state, auth))]
pub async fn duplicate_global_template(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((kind, id)): Path<(TemplateKind, String)>,
) -> Result<(StatusCode, Json<ExportTemplate>), AppError> {
    let maintainer = CatalogMaintainer::from_claims(&auth.0)?;
    let copy = state.catalog.duplicate(&maintainer, kind, &id).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// POST /api/v1/catalog/{kind}/{id}/toggle
#[tracing::instrument(name = "http.toggle_global_template", skip(state, auth))]
pub async fn toggle_global_template(
    State(state): State<AppState>,
    auth: AuthClaims,
    Path((kind, id)): Path<(TemplateKind, String)>,
) -> Result<Json<ExportTemplate>, AppError> {
    let maintainer = CatalogMaintainer::from_claims(&auth.0)?;
    Ok(Json(state.catalog.toggle_enabled(&maintainer, kind, &id).await?))
}

/// GET /api/v1/catalog/stream
pub async fn catalog_stream(
    State(state): State<AppState>,
    _auth: AuthClaims,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let mut subscription = state.catalog.subscribe();
    let initial = state.catalog.snapshot().await?;

    let stream = async_stream::stream! {
        let mut last_version = initial.version;
        yield Ok(catalog_event(&initial));

        while let Some(next) = subscription.next().await {
            match next {
                Ok(snapshot) if snapshot.version > last_version => {
                    last_version = snapshot.version;
                    yield Ok(catalog_event(&snapshot));
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Dropping undecodable catalog change"),
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("heartbeat"),
    ))
}

fn catalog_event(snapshot: &CatalogSnapshot) -> Event {
    match Event::default()
        .event("catalog")
        .id(snapshot.version.to_string())
        .json_data(snapshot)
    {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode catalog snapshot");
            Event::default().event("error").data("encode failed")
        }
    }
}
