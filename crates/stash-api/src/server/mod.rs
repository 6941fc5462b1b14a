//! Server setup and initialization
//!
//! Builds the service context for the configured storage backend, the
//! router, and runs the HTTP server.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use stash_common::{AccessTokenIssuer, AppConfig, AppError, StorageBackend};
use stash_db::{bootstrap_schema, create_pool, PgRefreshTokenRepository, PgUserRepository};
use stash_service::services::spawn_cleanup_scheduler;
use stash_service::{LogMailer, ServiceContext};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::middleware::{apply_common_middleware, apply_middleware};
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let config = state.config();
    let api = apply_middleware(
        create_router(),
        &config.rate_limit,
        &config.cors,
        config.app.env.is_production(),
    );
    let health = apply_common_middleware(health_routes());

    api.merge(health).with_state(state)
}

/// Wire storage, issuer and mailer into a service context
pub async fn create_service_context(config: &AppConfig) -> Result<ServiceContext, AppError> {
    let builder = ServiceContext::builder()
        .issuer(Arc::new(AccessTokenIssuer::from_config(&config.jwt)))
        .refresh_token_lifetime(config.jwt.refresh_token_lifetime())
        .mailer(Arc::new(LogMailer))
        .links(config.links.clone());

    let builder = match (config.storage, &config.database) {
        (StorageBackend::Memory, _) => {
            info!("Using in-memory storage; data is lost on restart");
            builder.in_memory_storage()
        }
        (StorageBackend::Postgres, Some(db_config)) => {
            info!("Connecting to PostgreSQL...");
            let pool = create_pool(db_config)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            bootstrap_schema(&pool)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            info!("PostgreSQL connection established");

            builder
                .user_repo(Arc::new(PgUserRepository::new(pool.clone())))
                .refresh_token_repo(Arc::new(PgRefreshTokenRepository::new(pool.clone())))
                .pool(pool)
        }
        (StorageBackend::Postgres, None) => {
            return Err(AppError::Config("DATABASE_URL is required for the postgres backend".to_string()));
        }
    };

    builder.build().map_err(|e| AppError::Config(e.to_string()))
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    let service_context = create_service_context(&config).await?;
    Ok(AppState::new(service_context, config))
}

/// Run the HTTP server until Ctrl+C or SIGTERM
pub async fn run_server(app: Router, listener: TcpListener) -> Result<(), AppError> {
    let addr = listener
        .local_addr()
        .map_err(|e| AppError::Config(format!("Failed to read listener address: {e}")))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    info!("Server shutdown complete");
    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.api.address();
    let cleanup_every = Duration::from_secs(config.cleanup.interval_secs.max(1));

    let state = create_app_state(config).await?;

    let cleanup = spawn_cleanup_scheduler(state.service_context().refresh_tokens().clone(), cleanup_every);
    info!(interval_secs = cleanup_every.as_secs(), "Refresh token cleanup scheduled");

    let app = create_app(state);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    let result = run_server(app, listener).await;
    cleanup.abort();
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
