use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;

use atlas_config_service::config::Settings;
use atlas_config_service::postgres::PostgresPool;
use atlas_config_service::redis::RedisPool;
use atlas_config_service::server::{create_app, AppState};
use atlas_config_service::store::create_document_store;
use atlas_config_service::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new().context("Failed to load configuration")?;
    let _telemetry = init_telemetry(&settings.otel, &settings.logging)?;
    tracing::info!(backend = %settings.store.backend, "Configuration loaded");

    let backend = settings.store.backend.to_ascii_lowercase();
    let redis_pool = match backend.as_str() {
        "redis" => Some(Arc::new(
            RedisPool::new(settings.redis.clone()).context("Failed to create Redis pool")?,
        )),
        _ => None,
    };

    let postgres_pool = match (backend.as_str(), &settings.database) {
        ("postgres", Some(database)) => {
            let pool = PostgresPool::new(database)
                .await
                .context("Failed to connect to PostgreSQL")?;
            pool.ensure_schema()
                .await
                .context("Failed to prepare PostgreSQL schema")?;
            tracing::info!(url = %pool.database_url_masked(), "PostgreSQL connected");
            Some(Arc::new(pool))
        }
        _ => None,
    };

    let store = create_document_store(&settings.store, redis_pool, postgres_pool.clone());
    let state = AppState::new(settings.clone(), store);
    tracing::info!(backend = %state.store.backend_type(), "Application state initialized");

    let app = create_app(state);

    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = postgres_pool {
        pool.close().await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
