//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, InMemoryCaseStore},
    app::build_router,
    config::Config,
    error::ApiError,
    feed::spawn_change_feed,
    web::state::AppState,
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use campus_support_core::ports::{CaseRepository, ChangeFeed};
use campus_support_core::sync::ChangeDispatcher;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Pick the Case Store ---
    let (cases, feed): (Arc<dyn CaseRepository>, Arc<dyn ChangeFeed>) =
        match config.database_url.as_deref() {
            Some(database_url) => {
                info!("Connecting to database...");
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .connect(database_url)
                    .await?;
                let db_adapter = Arc::new(DbAdapter::new(db_pool));
                if config.run_migrations {
                    info!("Running database migrations...");
                    db_adapter.run_migrations().await?;
                    info!("Database migrations complete.");
                }
                let cases: Arc<dyn CaseRepository> = db_adapter.clone();
                let feed: Arc<dyn ChangeFeed> = db_adapter;
                (cases, feed)
            }
            None => {
                warn!("DATABASE_URL is not set; cases are kept in memory and lost on restart.");
                let store = Arc::new(InMemoryCaseStore::new());
                let cases: Arc<dyn CaseRepository> = store.clone();
                let feed: Arc<dyn ChangeFeed> = store;
                (cases, feed)
            }
        };

    // --- 3. Start the Change Feed ---
    let dispatcher = ChangeDispatcher::new();
    let shutdown = CancellationToken::new();
    let feed_task = spawn_change_feed(feed, dispatcher.clone(), shutdown.clone());

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        cases,
        dispatcher,
    });

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let app = build_router(app_state, Some(cors));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    shutdown.cancel();
    if let Err(e) = feed_task.await {
        warn!("Change feed task ended abnormally: {:?}", e);
    }
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
