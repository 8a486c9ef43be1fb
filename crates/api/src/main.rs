use anyhow::Result;
use std::time::Duration;
use tracing::info;

use transdesk_api::{
    app::AppState,
    config::Config,
    middleware,
    services::bootstrap::bootstrap_users,
    tasks::{ChannelMetricsTask, PoolMetricsTask, TaskScheduler},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    middleware::logging::init_logging(&config.logging)?;
    middleware::init_metrics()?;

    info!("Starting Transdesk API v{}", env!("CARGO_PKG_VERSION"));

    let db_config: persistence::db::DatabaseConfig = (&config.database).into();
    let pool = persistence::db::create_pool(&db_config).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let created = bootstrap_users(&pool, &config.bootstrap).await?;
    if !created.is_empty() {
        info!(users = ?created, "Bootstrap users created");
    }

    let addr = config.socket_addr()?;
    let state = AppState::new(config, pool.clone())?;

    let mut scheduler = TaskScheduler::new();
    scheduler.register(PoolMetricsTask::new(pool));
    scheduler.register(ChannelMetricsTask::new(state.channels.clone()));
    scheduler.start();

    let app = transdesk_api::app::create_router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(5)).await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
