use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dealroom_api::background;
use dealroom_api::config::{LogFormat, ServerConfig};
use dealroom_api::router::build_app_router;
use dealroom_api::state::AppState;
use dealroom_cloud::S3DocumentStore;
use dealroom_core::clock::SystemClock;
use dealroom_db::PgStore;
use dealroom_events::{EventBus, EventLogger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dealroom_api=debug,dealroom_core=debug,dealroom_events=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match LogFormat::from_env() {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = dealroom_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    dealroom_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    dealroom_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Document storage ---
    let blobs = S3DocumentStore::connect(&config.s3)
        .await
        .context("Failed to configure S3 document store")?;

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let cancel = CancellationToken::new();
    let logger_handle = tokio::spawn(EventLogger::run(event_bus.subscribe(), cancel.clone()));
    tracing::info!("Event bus created");

    // --- App state ---
    let config = Arc::new(config);
    let state = AppState::new(
        Arc::clone(&config),
        Arc::new(PgStore::new(pool)),
        Arc::new(blobs),
        Arc::new(SystemClock),
        Arc::clone(&event_bus),
    );

    // --- Orphan sweep ---
    let sweep_handle = config.orphan_sweep_interval.map(|interval| {
        tokio::spawn(background::orphan_sweep::run(
            state.documents.clone(),
            interval,
            config.orphan_sweep_grace,
            cancel.clone(),
        ))
    });

    // --- Router ---
    let app = build_app_router(state, &config)?;

    // --- Start server ---
    let host = config
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    if let Some(handle) = sweep_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tracing::info!("Orphan sweep stopped");
    }
    let _ = tokio::time::timeout(Duration::from_secs(5), logger_handle).await;
    tracing::info!("Event logger stopped");

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
