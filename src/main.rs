//! ridepool server entry point.
//!
//! Starts the Axum HTTP server: loads configuration, connects to
//! Postgres, runs migrations, and serves until Ctrl+C or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ridepool::api;
use ridepool::app_state::AppState;
use ridepool::auth::{CognitoIdentityProvider, IdentityProvider, TokenService};
use ridepool::config::AppConfig;
use ridepool::persistence::postgres::PgStore;
use ridepool::service::{AuthService, MembershipService, PoolService, QueryService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting ridepool");

    // Connect to Postgres and bring the schema up to date
    let store = Arc::new(PgStore::connect(&config).await?);
    store.run_migrations().await?;
    tracing::info!("database ready");

    // Build the auth layer
    let tokens = Arc::new(TokenService::from_config(&config));
    let provider: Arc<dyn IdentityProvider> = Arc::new(CognitoIdentityProvider::new(&config)?);

    // Build application state
    let app_state = AppState {
        auth: Arc::new(AuthService::new(
            Arc::clone(&store),
            provider,
            Arc::clone(&tokens),
            config.allowed_email_domain.clone(),
        )),
        pools: Arc::new(PoolService::new(Arc::clone(&store))),
        membership: Arc::new(MembershipService::new(Arc::clone(&store))),
        query: Arc::new(QueryService::new(Arc::clone(&store))),
        tokens,
    };

    // Build router
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves when the process receives Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
