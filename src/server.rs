//! HTTP server initialization and runtime setup.
//!
//! Handles storage connection, schema setup, service wiring and the Axum
//! server lifecycle.

use crate::application::services::LinkService;
use crate::config::{Config, StorageBackend};
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::persistence::{
    MemoryLinkRepository, PgLinkRepository, RedisLinkRepository, connect_with_retry,
};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Storage backend (with startup retries)
/// - Schema migrations (PostgreSQL only)
/// - Link service
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Storage stays unreachable after every connection attempt
/// - Migrations fail
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repository = open_repository(&config).await?;
    tracing::info!(backend = repository.backend(), "Storage ready");

    let link_service = LinkService::new(repository, config.base_url.clone())
        .with_code_strategy(config.code_strategy, config.code_length)
        .with_click_update_timeout(config.click_update_timeout());

    let state = AppState::new(Arc::new(link_service));
    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Connects the configured backend, retrying per the startup policy.
async fn open_repository(config: &Config) -> Result<Arc<dyn LinkRepository>> {
    let policy = config.retry_policy();

    match config.storage_backend {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DB_DSN must be set when STORAGE_BACKEND=postgres")?;
            let settings = config.pool_settings();
            let settings = &settings;

            let repository = connect_with_retry("postgres", policy, || {
                PgLinkRepository::connect(database_url, settings)
            })
            .await
            .context("Failed to connect to PostgreSQL")?;
            tracing::info!("Connected to database");

            repository
                .init_schema()
                .await
                .context("Failed to apply migrations")?;

            Ok(Arc::new(repository))
        }
        StorageBackend::Redis => {
            let redis_url = config.redis_url.as_str();

            let repository = connect_with_retry("redis", policy, || {
                RedisLinkRepository::connect(redis_url)
            })
            .await
            .context("Failed to connect to Redis")?;

            Ok(Arc::new(repository))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, links are lost on restart");
            Ok(Arc::new(MemoryLinkRepository::new()))
        }
    }
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
