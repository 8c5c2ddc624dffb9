//! HTTP API integration tests
//!
//! Drives the full router with `tower::ServiceExt::oneshot` over an
//! in-memory document store. Tokens are minted with the test secret.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use atlas_config_service::auth::{Claims, CATALOG_MAINTAINER_ROLE, PLATFORM_ADMIN_ROLE};
use atlas_config_service::config::{
    JwtConfig, LoggingConfig, OtelConfig, RedisConfig, ServerConfig, Settings, StoreConfig,
};
use atlas_config_service::server::{create_app, AppState};
use atlas_config_service::store::MemoryDocumentStore;

const SECRET: &str = "atlas-api-test-secret";

fn test_app() -> Router {
    let settings = Settings {
        server: ServerConfig::default(),
        jwt: JwtConfig {
            secret: SECRET.to_string(),
            issuer: None,
            audience: None,
        },
        store: StoreConfig::default(),
        redis: RedisConfig::default(),
        database: None,
        otel: OtelConfig::default(),
        logging: LoggingConfig::default(),
    };
    create_app(AppState::new(settings, Arc::new(MemoryDocumentStore::new())))
}

fn token(roles: &[&str], tenant_id: Option<&str>) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: "operator-1".to_string(),
        exp: now + 300,
        iat: now,
        roles: roles.iter().map(|r| r.to_string()).collect(),
        tenant_id: tenant_id.map(str::to_string),
        extra: Default::default(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn springfield_operator() -> String {
    token(&[], Some("springfield"))
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl TestResponse {
    fn version(&self) -> u64 {
        self.headers[header::ETAG]
            .to_str()
            .unwrap()
            .trim_matches('"')
            .parse()
            .unwrap()
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
    if_match: Option<u64>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(version) = if_match {
        builder = builder.header(header::IF_MATCH, format!("\"{}\"", version));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}

async fn initialize(app: &Router, token: &str) -> TestResponse {
    let response = send(
        app,
        Method::POST,
        "/api/v1/tenants/springfield/config/initialize",
        Some(token),
        Some(json!({"displayName": "Springfield"})),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response
}

// =============================================================================
// Health & Auth Tests
// =============================================================================

mod health_and_auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let response = send(&app, Method::GET, "/health", None, None, None).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["status"], "healthy");
        assert_eq!(response.body["store"]["backend"], "memory");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let app = test_app();
        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = test_app();
        let response = send(
            &app,
            Method::GET,
            "/api/v1/tenants/springfield/config",
            None,
            None,
            None,
        )
        .await;

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let app = test_app();
        let response = send(
            &app,
            Method::GET,
            "/api/v1/tenants/springfield/config",
            Some("not-a-jwt"),
            None,
            None,
        )
        .await;

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_other_tenant_is_forbidden() {
        let app = test_app();
        let shelbyville = token(&[], Some("shelbyville"));
        let response = send(
            &app,
            Method::GET,
            "/api/v1/tenants/springfield/config",
            Some(&shelbyville),
            None,
            None,
        )
        .await;

        assert_eq!(response.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_platform_admin_may_manage_any_tenant() {
        let app = test_app();
        let admin = token(&[PLATFORM_ADMIN_ROLE], None);
        let response = send(
            &app,
            Method::GET,
            "/api/v1/tenants/springfield/config",
            Some(&admin),
            None,
            None,
        )
        .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["status"], "uninitialized");
        assert_eq!(response.body["version"], 0);
    }
}

// =============================================================================
// Configuration Lifecycle Tests
// =============================================================================

mod config_tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_edit_publish() {
        let app = test_app();
        let operator = springfield_operator();

        let created = initialize(&app, &operator).await;
        assert_eq!(created.body["status"], "live");
        assert_eq!(created.body["liveConfig"]["ui"]["headerTitle"], "Springfield");
        assert!(created.body.get("draftConfig").is_none());

        let edited = send(
            &app,
            Method::PATCH,
            "/api/v1/tenants/springfield/config",
            Some(&operator),
            Some(json!({"section": "ui", "value": {"headerTitle": "Springfield GIS"}})),
            Some(created.version()),
        )
        .await;
        assert_eq!(edited.status, StatusCode::OK);
        assert_eq!(edited.body["status"], "liveWithDraft");
        assert_eq!(edited.body["draftConfig"]["ui"]["headerTitle"], "Springfield GIS");
        assert_eq!(edited.body["liveConfig"]["ui"]["headerTitle"], "Springfield");

        let render = send(
            &app,
            Method::GET,
            "/api/v1/tenants/springfield/config/render?preview=draft",
            Some(&operator),
            None,
            None,
        )
        .await;
        assert_eq!(render.body["ui"]["headerTitle"], "Springfield GIS");

        let published = send(
            &app,
            Method::POST,
            "/api/v1/tenants/springfield/config/publish",
            Some(&operator),
            None,
            Some(edited.version()),
        )
        .await;
        assert_eq!(published.status, StatusCode::OK);
        assert_eq!(published.body["status"], "live");
        assert_eq!(published.body["liveConfig"]["ui"]["headerTitle"], "Springfield GIS");
    }

    #[tokio::test]
    async fn test_etag_exposed_to_cross_origin_clients() {
        let app = test_app();
        let operator = springfield_operator();
        initialize(&app, &operator).await;

        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/v1/tenants/springfield/config")
            .header(header::AUTHORIZATION, format!("Bearer {}", operator))
            .header(header::ORIGIN, "https://editor.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::ETAG));
        let exposed = response.headers()[header::ACCESS_CONTROL_EXPOSE_HEADERS]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(exposed.contains("etag"));
    }

    #[tokio::test]
    async fn test_if_match_star_is_unconditional() {
        let app = test_app();
        let operator = springfield_operator();
        initialize(&app, &operator).await;

        let request = Request::builder()
            .method(Method::PATCH)
            .uri("/api/v1/tenants/springfield/config")
            .header(header::AUTHORIZATION, format!("Bearer {}", operator))
            .header(header::IF_MATCH, "*")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"section": "ui", "value": {"headerTitle": "Springfield GIS"}}).to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stale_if_match_is_precondition_failed() {
        let app = test_app();
        let operator = springfield_operator();
        let created = initialize(&app, &operator).await;

        let patch = json!([{"section": "messages", "value": {"welcomeTitle": "Hi"}}]);
        let first = send(
            &app,
            Method::PATCH,
            "/api/v1/tenants/springfield/config",
            Some(&operator),
            Some(patch.clone()),
            Some(created.version()),
        )
        .await;
        assert_eq!(first.status, StatusCode::OK);

        let second = send(
            &app,
            Method::PATCH,
            "/api/v1/tenants/springfield/config",
            Some(&operator),
            Some(patch),
            Some(created.version()),
        )
        .await;
        assert_eq!(second.status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(second.body["error"]["code"], "VERSION_CONFLICT");
    }

    #[tokio::test]
    async fn test_double_initialize_conflicts() {
        let app = test_app();
        let operator = springfield_operator();
        initialize(&app, &operator).await;

        let again = send(
            &app,
            Method::POST,
            "/api/v1/tenants/springfield/config/initialize",
            Some(&operator),
            Some(json!({"displayName": "Again"})),
            None,
        )
        .await;
        assert_eq!(again.status, StatusCode::CONFLICT);
        assert_eq!(again.body["error"]["code"], "ALREADY_INITIALIZED");
    }

    #[tokio::test]
    async fn test_uninitialize_blocked_by_maps() {
        let app = test_app();
        let operator = springfield_operator();
        initialize(&app, &operator).await;

        let maps = send(
            &app,
            Method::PUT,
            "/api/v1/tenants/springfield/config/maps",
            Some(&operator),
            Some(json!([{"id": "parcels", "name": "Parcels", "layerUrl": "https://gis/parcels"}])),
            None,
        )
        .await;
        assert_eq!(maps.status, StatusCode::OK);
        assert_eq!(
            maps.body["draftConfig"]["data"]["maps"][0]["layerUrl"],
            "https://gis/parcels"
        );

        let blocked = send(
            &app,
            Method::DELETE,
            "/api/v1/tenants/springfield/config",
            Some(&operator),
            None,
            None,
        )
        .await;
        assert_eq!(blocked.status, StatusCode::CONFLICT);
        assert_eq!(blocked.body["error"]["code"], "MAPS_STILL_CONFIGURED");

        let removed = send(
            &app,
            Method::DELETE,
            "/api/v1/tenants/springfield/config/maps/parcels",
            Some(&operator),
            None,
            None,
        )
        .await;
        assert_eq!(removed.status, StatusCode::OK);

        let gone = send(
            &app,
            Method::DELETE,
            "/api/v1/tenants/springfield/config",
            Some(&operator),
            None,
            None,
        )
        .await;
        assert_eq!(gone.status, StatusCode::OK);
        assert_eq!(gone.body["status"], "uninitialized");
    }

    #[tokio::test]
    async fn test_invalid_section_is_unprocessable() {
        let app = test_app();
        let operator = springfield_operator();
        initialize(&app, &operator).await;

        let response = send(
            &app,
            Method::PATCH,
            "/api/v1/tenants/springfield/config",
            Some(&operator),
            Some(json!({"section": "ui", "value": {"headerTitle": "  "}})),
            None,
        )
        .await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.body["error"]["code"], "VALIDATION_FAILED");
    }
}

// =============================================================================
// Template Library & Catalog Tests
// =============================================================================

mod template_tests {
    use super::*;

    #[tokio::test]
    async fn test_starter_session_save_and_duplicate() {
        let app = test_app();
        let operator = springfield_operator();
        initialize(&app, &operator).await;

        let session = send(
            &app,
            Method::POST,
            "/api/v1/tenants/springfield/templates/map/from-starter/standard",
            Some(&operator),
            None,
            None,
        )
        .await;
        assert_eq!(session.status, StatusCode::OK);
        assert_eq!(session.body["origin"], json!({"type": "starter", "id": "standard"}));

        let mut body = session.body["template"].clone();
        body["name"] = json!("Standard");
        let saved = send(
            &app,
            Method::POST,
            "/api/v1/tenants/springfield/templates/map",
            Some(&operator),
            Some(body),
            None,
        )
        .await;
        assert_eq!(saved.status, StatusCode::CREATED);
        let id = saved.body["id"].as_str().unwrap().to_string();

        let copy = send(
            &app,
            Method::POST,
            &format!("/api/v1/tenants/springfield/templates/map/{}/duplicate", id),
            Some(&operator),
            None,
            None,
        )
        .await;
        assert_eq!(copy.status, StatusCode::CREATED);
        assert_eq!(copy.body["name"], "Standard (Copy)");
        assert_ne!(copy.body["id"], saved.body["id"]);

        let list = send(
            &app,
            Method::GET,
            "/api/v1/tenants/springfield/templates/map",
            Some(&operator),
            None,
            None,
        )
        .await;
        assert_eq!(list.body["total"], 2);
    }

    #[tokio::test]
    async fn test_save_mints_id_ignoring_posted_id() {
        let app = test_app();
        let operator = springfield_operator();
        initialize(&app, &operator).await;

        let body = json!({"id": "template-from-global-entry", "name": "Reused"});
        let saved = send(
            &app,
            Method::POST,
            "/api/v1/tenants/springfield/templates/map",
            Some(&operator),
            Some(body),
            None,
        )
        .await;

        assert_eq!(saved.status, StatusCode::CREATED);
        let id = saved.body["id"].as_str().unwrap();
        assert_ne!(id, "template-from-global-entry");
        assert!(id.starts_with("template-"));
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let app = test_app();
        let operator = springfield_operator();
        initialize(&app, &operator).await;

        let saved = send(
            &app,
            Method::POST,
            "/api/v1/tenants/springfield/templates/feature",
            Some(&operator),
            Some(json!({"name": "Parcel Sheet"})),
            None,
        )
        .await;
        assert_eq!(saved.status, StatusCode::CREATED);
        let id = saved.body["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/tenants/springfield/templates/feature/{}", id);

        let unconfirmed = send(&app, Method::DELETE, &uri, Some(&operator), None, None).await;
        assert_eq!(unconfirmed.status, StatusCode::BAD_REQUEST);

        let confirmed = send(
            &app,
            Method::DELETE,
            &format!("{}?confirm={}", uri, id),
            Some(&operator),
            None,
            None,
        )
        .await;
        assert_eq!(confirmed.status, StatusCode::OK);
        assert_eq!(confirmed.body["id"], id.as_str());
    }

    #[tokio::test]
    async fn test_starters_listing() {
        let app = test_app();
        let operator = springfield_operator();
        let response = send(
            &app,
            Method::GET,
            "/api/v1/starters/feature",
            Some(&operator),
            None,
            None,
        )
        .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body[0]["id"], "feature-summary");
    }

    #[tokio::test]
    async fn test_catalog_writes_need_maintainer_role() {
        let app = test_app();
        let operator = springfield_operator();
        let maintainer = token(&[CATALOG_MAINTAINER_ROLE], None);
        let body = json!({"name": "County Standard", "pageSize": "a4"});

        let denied = send(
            &app,
            Method::POST,
            "/api/v1/catalog/map",
            Some(&operator),
            Some(body.clone()),
            None,
        )
        .await;
        assert_eq!(denied.status, StatusCode::FORBIDDEN);
        assert_eq!(denied.body["error"]["code"], "PERMISSION_DENIED");

        let created = send(
            &app,
            Method::POST,
            "/api/v1/catalog/map",
            Some(&maintainer),
            Some(body),
            None,
        )
        .await;
        assert_eq!(created.status, StatusCode::CREATED);

        let listed = send(&app, Method::GET, "/api/v1/catalog/map", Some(&operator), None, None).await;
        assert_eq!(listed.body["total"], 1);
        assert_eq!(listed.body["templates"][0]["name"], "County Standard");
    }
}
