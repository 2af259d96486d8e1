use anyhow::Context;
use std::sync::Arc;

use weather_station_api::{app, config::AppConfig, database, services, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(AppConfig::from_env());
    tracing::info!("Starting weather station API in {:?} mode", config.environment);

    let pool = database::manager::connect(&config.database)
        .context("failed to configure database pool")?;

    // Connections are lazy; an unreachable database degrades /health rather
    // than blocking startup.
    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(()) => tracing::info!("Database migrations applied"),
        Err(e) => tracing::warn!("Could not run migrations: {}", e),
    }

    let state = AppState::new(config.clone(), pool).context("JWT_SECRET must be set")?;

    services::retention::spawn_sweeper(state.users.clone(), config.retention.clone());

    let app = app::router(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}
