use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::server::AppState;

use super::catalog::{
    catalog_stream, create_global_template, delete_global_template, duplicate_global_template,
    get_catalog, get_global_template, list_global_templates, toggle_global_template,
    update_global_template,
};
use super::config::{
    add_map, config_stream, discard_draft, edit_config, get_config, initialize_config,
    publish_config, remove_map, render_config, set_maps, uninitialize_config,
};
use super::health::health;
use super::metrics::prometheus_metrics;
use super::template::{
    blank_session, create_template, delete_template, duplicate_template, get_starters,
    get_template, global_session, list_templates, reorder_templates, starter_session,
    toggle_template, update_template,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1",
            Router::new()
                .merge(config_routes())
                .merge(template_routes())
                .merge(catalog_routes()),
        )
}

fn config_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tenants/{tenant_id}/config",
            get(get_config).patch(edit_config).delete(uninitialize_config),
        )
        .route("/tenants/{tenant_id}/config/render", get(render_config))
        .route("/tenants/{tenant_id}/config/stream", get(config_stream))
        .route("/tenants/{tenant_id}/config/initialize", post(initialize_config))
        .route("/tenants/{tenant_id}/config/publish", post(publish_config))
        .route("/tenants/{tenant_id}/config/discard", post(discard_draft))
        .route("/tenants/{tenant_id}/config/maps", put(set_maps).post(add_map))
        .route("/tenants/{tenant_id}/config/maps/{map_id}", delete(remove_map))
}

fn template_routes() -> Router<AppState> {
    Router::new()
        .route("/starters/{kind}", get(get_starters))
        .route(
            "/tenants/{tenant_id}/templates/{kind}",
            get(list_templates).post(create_template),
        )
        .route("/tenants/{tenant_id}/templates/{kind}/blank", post(blank_session))
        .route("/tenants/{tenant_id}/templates/{kind}/order", put(reorder_templates))
        .route(
            "/tenants/{tenant_id}/templates/{kind}/from-starter/{starter_id}",
            post(starter_session),
        )
        .route(
            "/tenants/{tenant_id}/templates/{kind}/from-global/{global_id}",
            post(global_session),
        )
        .route(
            "/tenants/{tenant_id}/templates/{kind}/{id}",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route(
            "/tenants/{tenant_id}/templates/{kind}/{id}/duplicate",
            post(duplicate_template),
        )
        .route(
            "/tenants/{tenant_id}/templates/{kind}/{id}/toggle",
            post(toggle_template),
        )
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(get_catalog))
        .route("/catalog/stream", get(catalog_stream))
        .route(
            "/catalog/{kind}",
            get(list_global_templates).post(create_global_template),
        )
        .route(
            "/catalog/{kind}/{id}",
            get(get_global_template)
                .put(update_global_template)
                .delete(delete_global_template),
        )
        .route("/catalog/{kind}/{id}/duplicate", post(duplicate_global_template))
        .route("/catalog/{kind}/{id}/toggle", post(toggle_global_template))
}
