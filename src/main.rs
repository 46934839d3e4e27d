mod config;
mod models;
mod routes;
mod services;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::{
    account::AccountService,
    catalog_cache::{CatalogCache, SystemClock},
    cleanup::{start_cleanup_task, CleanupConfig},
    credentials::CredentialStore,
    player::PlayerRegistry,
    xtream::XtreamClient,
};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<CatalogCache>,
    pub accounts: Arc<AccountService>,
    pub credentials: Arc<CredentialStore>,
    pub players: Arc<PlayerRegistry>,
    pub start_time: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iptvplayer_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting IPTV Player Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app_env);

    // Initialize services
    let api = Arc::new(XtreamClient::new(
        Duration::from_millis(config.fetch_timeout_ms),
        &config.user_agent,
    )?);

    let credentials = Arc::new(CredentialStore::open(&config.credentials_file).await?);
    match credentials.current() {
        Some(user) => tracing::info!("Stored login found for {}", user.username),
        None => tracing::info!("No stored login: {}", config.credentials_file),
    }

    let catalog = Arc::new(CatalogCache::new(api.clone(), Arc::new(SystemClock)));
    let accounts = Arc::new(AccountService::new(
        api,
        credentials.clone(),
        catalog.clone(),
    ));
    let players = Arc::new(PlayerRegistry::new(config.max_player_sessions));
    tracing::info!(
        "Player registry initialized (max {} sessions)",
        config.max_player_sessions
    );

    // Start cleanup task (runs in background)
    tokio::spawn(start_cleanup_task(
        players.clone(),
        CleanupConfig {
            interval_secs: config.cleanup_interval_secs,
            idle_timeout_secs: config.player_idle_timeout_secs,
        },
    ));
    tracing::info!(
        "Cleanup task started (idle sessions closed after {}s)",
        config.player_idle_timeout_secs
    );

    // Build application state
    let state = Arc::new(AppState {
        config,
        catalog,
        accounts,
        credentials,
        players: players.clone(),
        start_time: Instant::now(),
    });

    // Build router
    let app = routes::router(state)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Release every engine before exiting
    players.dispose_all().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
